//! # Window width
//!
//! Width of the radial window needed at each sample to reach the requested resolution.
//!
//! Without the b-factor, the diffraction-limited width is `W = 2F²/res`. With it, the
//! oscillator phase noise (Allan deviation σ) widens the window and `W` solves the implicit
//! equation of MTR86 (Eq. 19), written in terms of the principal Lambert W branch:
//!
//! ```text
//! ω  = 2π f_sky
//! α  = ω²σ² / (2 ρ̇)
//! P  = res / (α F²)          (must exceed 1)
//! P1 = P / (1 − P)
//! P2 = P1 · exp(P1)
//! W  = |W0(P2) − P1| / α
//! ```
//!
//! Both forms are finally scaled by the normalized equivalent width of the window.

use crate::constants::{Kilometer, BFACTOR_BRANCH_EPS, DPI, RCPR_E};
use crate::diffrec_errors::DiffrecError;
use crate::special_functions::lambert_w0;
use crate::window_functions::WindowType;

/// Diffraction-limited width `2F²/res` (km).
#[inline]
pub fn simple_width(f_km: Kilometer, res_km: Kilometer) -> Kilometer {
    2.0 * f_km * f_km / res_km
}

/// Per-sample window widths.
///
/// Arguments
/// -----------------
/// * `f_km`: Fresnel scale at each sample (km)
/// * `f_sky_hz`: sky frequency at each sample (Hz)
/// * `rho_dot_kms`: positive radial velocity at each sample (km/s)
/// * `res_km`: requested resolution (km)
/// * `window`: the tapering window, provides `normeq`
/// * `bfactor`: apply the oscillator-noise correction
/// * `sigma`: Allan deviation used by the correction
///
/// Return
/// ----------
/// * The widths (km), or [`DiffrecError::BFactorSingularity`] when `P ≤ 1` at some sample.
#[allow(clippy::too_many_arguments)]
pub fn window_widths(
    f_km: &[Kilometer],
    f_sky_hz: &[f64],
    rho_dot_kms: &[f64],
    res_km: Kilometer,
    window: WindowType,
    bfactor: bool,
    sigma: f64,
) -> Result<Vec<Kilometer>, DiffrecError> {
    let normeq = window.normeq();

    if !bfactor {
        return Ok(f_km
            .iter()
            .map(|f| normeq * simple_width(*f, res_km))
            .collect());
    }

    let alpha: Vec<f64> = f_sky_hz
        .iter()
        .zip(rho_dot_kms)
        .map(|(fs, v)| {
            let omega = DPI * fs;
            omega * omega * sigma * sigma / (2.0 * v)
        })
        .collect();

    let p: Vec<f64> = alpha
        .iter()
        .zip(f_km)
        .map(|(a, f)| res_km / (a * f * f))
        .collect();

    let min_p = p.iter().copied().fold(f64::INFINITY, f64::min);
    if min_p.is_nan() || min_p <= 1.0 {
        return Err(DiffrecError::BFactorSingularity { min_p });
    }

    Ok(p
        .iter()
        .zip(&alpha)
        .zip(f_km)
        .map(|((p, a), f)| normeq * bfactor_width(*p, *a, *f, res_km))
        .collect())
}

/// Unscaled b-factor width at one sample, `P > 1` assumed.
fn bfactor_width(p: f64, alpha: f64, f_km: Kilometer, res_km: Kilometer) -> Kilometer {
    let p1 = p / (1.0 - p);
    let p2 = p1 * p1.exp();

    if (RCPR_E + p2).abs() < BFACTOR_BRANCH_EPS {
        simple_width(f_km, res_km)
    } else {
        (lambert_w0(p2) - p1).abs() / alpha
    }
}
