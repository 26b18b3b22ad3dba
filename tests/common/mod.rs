#![allow(dead_code)]

use std::f64::consts::TAU;

use diffrec::observation::{AncillarySeries, DiffractionObservation};

/// First radius of the synthetic profiles (km)
pub const RHO_0: f64 = 87_000.0;
/// Sample spacing of the synthetic profiles (km)
pub const DX: f64 = 0.25;
/// 87000 to 87200 km
pub const N_SAMPLES: usize = 801;

/// Saturn-like X-band occultation: B = 0.5 rad, φ = 1.2 rad, D = 2.3e5 km, 10 km/s.
///
/// The Fresnel scale is about 2.43 km, a 1 km resolution needs a ~19.5 km kb25 window.
pub fn saturn_observation(
    n: usize,
    p_norm: impl Fn(f64) -> f64,
    phase: impl Fn(f64) -> f64,
) -> DiffractionObservation {
    let rho: Vec<f64> = (0..n).map(|k| RHO_0 + DX * k as f64).collect();
    let p = rho.iter().map(|r| p_norm(*r)).collect();
    let ph = rho.iter().map(|r| phase(*r)).collect();

    DiffractionObservation::new(
        rho,
        p,
        ph,
        vec![0.5; n],
        vec![2.3e5; n],
        vec![1.2; n],
        vec![8.427e9; n],
        vec![10.0; n],
    )
}

/// Unobstructed signal: unit power, zero phase.
pub fn free_space(n: usize) -> DiffractionObservation {
    saturn_observation(n, |_| 1.0, |_| 0.0)
}

/// Slowly varying ring, far from any diffraction feature.
pub fn smooth_ring(n: usize) -> DiffractionObservation {
    saturn_observation(
        n,
        |r| 1.0 + 0.1 * (TAU * r / 200.0).sin(),
        |r| 0.05 * (TAU * r / 150.0).cos(),
    )
}

/// Ancillary series whose time is the sample index and whose raw threshold is constant.
pub fn indexed_ancillary(n: usize, raw_tau_threshold: f64) -> AncillarySeries {
    let mut anc = AncillarySeries::zeros(n);
    anc.t_oet_spm = (0..n).map(|k| k as f64).collect();
    anc.t_ret_spm = (0..n).map(|k| k as f64 - 0.5).collect();
    anc.raw_tau_threshold = vec![raw_tau_threshold; n];
    anc
}

/// Reverse every per-sample array, as an egress profile would arrive.
pub fn reversed(obs: &DiffractionObservation) -> DiffractionObservation {
    let rev = |v: &[f64]| -> Vec<f64> { v.iter().rev().copied().collect() };
    let mut out = DiffractionObservation::new(
        rev(&obs.rho_km),
        rev(&obs.p_norm),
        rev(&obs.phase_rad),
        rev(&obs.b_rad),
        rev(&obs.d_km),
        rev(&obs.phi_rad),
        rev(&obs.f_sky_hz),
        rev(&obs.rho_dot_kms).into_iter().map(|v| -v).collect(),
    );
    out.history = obs.history.clone();
    out.rev_info = obs.rev_info.clone();
    out
}
