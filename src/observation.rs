//! # Diffraction-limited observation
//!
//! [`DiffractionObservation`] is the in-memory profile produced by the upstream normalization
//! step: one entry per radial sample in each parallel array. The reconstruction only reads it.
//!
//! Besides the eight arrays used by the inversion, an observation may carry
//! [`AncillarySeries`] (event times, radius corrections, ring longitude, threshold optical
//! depth) that are passed through to the result, and the upstream `history` / `rev_info`
//! maps that end up in the result provenance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{Hertz, Kilometer, KmPerSec, Radian};

/// Per-sample series carried along the reconstruction without entering the inversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AncillarySeries {
    /// Observed event time (seconds past midnight)
    pub t_oet_spm: Vec<f64>,
    /// Ring event time (seconds past midnight)
    pub t_ret_spm: Vec<f64>,
    /// Spacecraft event time (seconds past midnight)
    pub t_set_spm: Vec<f64>,
    /// Radius correction from the pole direction (km)
    pub rho_corr_pole_km: Vec<Kilometer>,
    /// Radius correction from the timing offset (km)
    pub rho_corr_timing_km: Vec<Kilometer>,
    /// Ring longitude (rad)
    pub phi_rl_rad: Vec<Radian>,
    /// Threshold optical depth before the resolution term
    pub raw_tau_threshold: Vec<f64>,
}

impl AncillarySeries {
    /// Zero-filled series of length `n`.
    pub fn zeros(n: usize) -> Self {
        AncillarySeries {
            t_oet_spm: vec![0.0; n],
            t_ret_spm: vec![0.0; n],
            t_set_spm: vec![0.0; n],
            rho_corr_pole_km: vec![0.0; n],
            rho_corr_timing_km: vec![0.0; n],
            phi_rl_rad: vec![0.0; n],
            raw_tau_threshold: vec![0.0; n],
        }
    }

    /// Named view of every series, in declaration order.
    pub(crate) fn fields(&self) -> [(&'static str, &[f64]); 7] {
        [
            ("t_oet_spm", &self.t_oet_spm[..]),
            ("t_ret_spm", &self.t_ret_spm[..]),
            ("t_set_spm", &self.t_set_spm[..]),
            ("rho_corr_pole_km", &self.rho_corr_pole_km[..]),
            ("rho_corr_timing_km", &self.rho_corr_timing_km[..]),
            ("phi_rl_rad", &self.phi_rl_rad[..]),
            ("raw_tau_threshold", &self.raw_tau_threshold[..]),
        ]
    }

    /// Apply `f` to every series and collect the results.
    pub(crate) fn map(&self, f: impl Fn(&[f64]) -> Vec<f64>) -> Self {
        AncillarySeries {
            t_oet_spm: f(&self.t_oet_spm),
            t_ret_spm: f(&self.t_ret_spm),
            t_set_spm: f(&self.t_set_spm),
            rho_corr_pole_km: f(&self.rho_corr_pole_km),
            rho_corr_timing_km: f(&self.rho_corr_timing_km),
            phi_rl_rad: f(&self.phi_rl_rad),
            raw_tau_threshold: f(&self.raw_tau_threshold),
        }
    }
}

/// Diffraction-limited profile of a ring occultation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffractionObservation {
    /// Ring-intercept radius (km)
    pub rho_km: Vec<Kilometer>,
    /// Normalized diffracted power
    pub p_norm: Vec<f64>,
    /// Signal phase (rad)
    pub phase_rad: Vec<Radian>,
    /// Ring opening angle (rad)
    pub b_rad: Vec<Radian>,
    /// Spacecraft to ring-intercept distance (km)
    pub d_km: Vec<Kilometer>,
    /// Ring azimuth angle (rad)
    pub phi_rad: Vec<Radian>,
    /// Sky frequency (Hz)
    pub f_sky_hz: Vec<Hertz>,
    /// Ring-intercept radial velocity (km/s)
    pub rho_dot_kms: Vec<KmPerSec>,

    pub ancillary: Option<AncillarySeries>,

    /// Processing history of the upstream product
    pub history: BTreeMap<String, String>,
    /// Revision information of the upstream product
    pub rev_info: BTreeMap<String, String>,
}

impl DiffractionObservation {
    /// Assemble an observation from its core arrays.
    ///
    /// Lengths are not checked here; validation happens when the reconstruction starts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rho_km: Vec<Kilometer>,
        p_norm: Vec<f64>,
        phase_rad: Vec<Radian>,
        b_rad: Vec<Radian>,
        d_km: Vec<Kilometer>,
        phi_rad: Vec<Radian>,
        f_sky_hz: Vec<Hertz>,
        rho_dot_kms: Vec<KmPerSec>,
    ) -> Self {
        DiffractionObservation {
            rho_km,
            p_norm,
            phase_rad,
            b_rad,
            d_km,
            phi_rad,
            f_sky_hz,
            rho_dot_kms,
            ..Default::default()
        }
    }

    pub fn with_ancillary(mut self, ancillary: AncillarySeries) -> Self {
        self.ancillary = Some(ancillary);
        self
    }

    pub fn with_history(mut self, history: BTreeMap<String, String>) -> Self {
        self.history = history;
        self
    }

    pub fn with_rev_info(mut self, rev_info: BTreeMap<String, String>) -> Self {
        self.rev_info = rev_info;
        self
    }

    /// Number of samples, taken from the radius array.
    pub fn len(&self) -> usize {
        self.rho_km.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rho_km.is_empty()
    }

    /// Named view of the core arrays, in declaration order.
    pub(crate) fn core_fields(&self) -> [(&'static str, &[f64]); 8] {
        [
            ("rho_km", &self.rho_km[..]),
            ("p_norm", &self.p_norm[..]),
            ("phase_rad", &self.phase_rad[..]),
            ("b_rad", &self.b_rad[..]),
            ("d_km", &self.d_km[..]),
            ("phi_rad", &self.phi_rad[..]),
            ("f_sky_hz", &self.f_sky_hz[..]),
            ("rho_dot_kms", &self.rho_dot_kms[..]),
        ]
    }
}

#[cfg(test)]
mod observation_test {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let obs = DiffractionObservation::new(
            vec![1.0, 2.0],
            vec![1.0; 2],
            vec![0.0; 2],
            vec![0.5; 2],
            vec![1e5; 2],
            vec![0.1; 2],
            vec![8.4e9; 2],
            vec![10.0; 2],
        )
        .with_ancillary(AncillarySeries::zeros(2))
        .with_history(BTreeMap::from([("user".to_string(), "ring".to_string())]));

        assert_eq!(obs.len(), 2);
        assert!(!obs.is_empty());
        assert_eq!(obs.ancillary.as_ref().map(|a| a.t_oet_spm.len()), Some(2));
        assert_eq!(obs.history["user"], "ring");
        assert!(obs.rev_info.is_empty());
        assert_eq!(obs.core_fields()[6].0, "f_sky_hz");
    }

    #[test]
    fn test_ancillary_map_applies_to_every_series() {
        let anc = AncillarySeries::zeros(4).map(|s| s.iter().map(|v| v + 1.0).collect());
        for (name, series) in anc.fields() {
            assert_eq!(series, &[1.0; 4], "{name}");
        }
    }
}
