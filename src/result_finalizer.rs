//! # Result finalization
//!
//! Turns the complex transmittance of a sweep into power, phase and optical depth, trims
//! per-sample arrays to the processed block, and records the provenance of the run.
//!
//! ```text
//! power     = |T|²
//! phase     = −atan2(Im T, Re T)
//! τ         = −μ · ln(power)                   (0 where power ≤ 0)
//! τ_thresh  = τ_raw − μ · ln(dx / res)
//! ```

use std::collections::BTreeMap;
use std::ops::Range;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::Kilometer;
use crate::params::ReconstructionParams;
use crate::region::RangeRequest;

/// Power and phase of a complex transmittance, phase with the sign of the input data.
pub fn power_and_phase(t: &[Complex64]) -> (Vec<f64>, Vec<f64>) {
    t.iter().map(|z| (z.norm_sqr(), -z.im.atan2(z.re))).unzip()
}

/// Normal optical depth `−μ·ln(power)`, zero where the power vanishes.
pub fn optical_depth(power: &[f64], mu: &[f64]) -> Vec<f64> {
    power
        .iter()
        .zip(mu)
        .map(|(p, m)| if *p > 0.0 { -m * p.ln() } else { 0.0 })
        .collect()
}

/// Threshold optical depth at the reconstructed resolution.
pub fn threshold_optical_depth(
    raw_tau_threshold: &[f64],
    mu: &[f64],
    dx_km: Kilometer,
    res_km: Kilometer,
) -> Vec<f64> {
    let log_ratio = (dx_km / res_km).ln();
    raw_tau_threshold
        .iter()
        .zip(mu)
        .map(|(raw, m)| raw - m * log_ratio)
        .collect()
}

/// Copy of `values[range]`.
#[inline]
pub fn trim<T: Clone>(values: &[T], range: Range<usize>) -> Vec<T> {
    values[range].to_vec()
}

/// Where a reconstruction comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub crate_name: String,
    pub crate_version: String,
    /// Resolved configuration
    pub params: ReconstructionParams,
    /// Range as requested by the caller
    pub requested_range: RangeRequest,
    /// `[rho_min, rho_max]` actually reconstructed (km)
    pub range_used_km: [Kilometer; 2],
    /// First processed sample, counted on the ascending radius grid
    pub start: usize,
    pub n_used: usize,
    /// The radius of the input was descending
    pub reversed_input: bool,
    /// Processing history of the input observation
    pub input_history: BTreeMap<String, String>,
    /// Revision information of the input observation
    pub input_rev_info: BTreeMap<String, String>,
}

impl Provenance {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: &ReconstructionParams,
        range_used_km: [Kilometer; 2],
        start: usize,
        n_used: usize,
        reversed_input: bool,
        input_history: &BTreeMap<String, String>,
        input_rev_info: &BTreeMap<String, String>,
    ) -> Self {
        Provenance {
            crate_name: env!("CARGO_PKG_NAME").to_string(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            params: params.clone(),
            requested_range: params.range,
            range_used_km,
            start,
            n_used,
            reversed_input,
            input_history: input_history.clone(),
            input_rev_info: input_rev_info.clone(),
        }
    }
}
