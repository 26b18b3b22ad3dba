//! # Input validation and normalization
//!
//! Turns a caller-owned [`DiffractionObservation`] into a [`NormalizedObservation`]: every
//! array checked, radius made ascending, velocity made positive, phase sign flipped once, and
//! the per-sample geometry derived.
//!
//! The checks are a pipeline of independent validators, each returning a tagged
//! [`DiffrecError`]; the first failure stops the pipeline.
//!
//! | stage               | failure                                               |
//! |---------------------|-------------------------------------------------------|
//! | finite values       | [`DiffrecError::NonRealInput`]                        |
//! | array lengths       | [`DiffrecError::ArrayLengthMismatch`]                 |
//! | physical ranges     | [`DiffrecError::ValueOutOfPhysicalRange`]             |
//! | sampling            | [`DiffrecError::InvalidResolution`] / out of range    |
//! | direction           | [`DiffrecError::ChordOccultationUnsupported`]         |
//!
//! Derived quantities
//! -----------------
//! * `mu = sin|B|`
//! * `λ = c / f_sky`
//! * `T̂ = √p · exp(i·phase)`
//! * `F = √( λD/2 · (1 − cos²B sin²φ) / sin²B )`

use itertools::{Itertools, MinMaxResult};
use num_complex::Complex64;

use crate::constants::{
    Kilometer, KmPerSec, Radian, ANGLE_TOLERANCE, DPI, RESOLUTION_SAMPLING_FACTOR,
    SPEED_OF_LIGHT_KM,
};
use crate::diffrec_errors::DiffrecError;
use crate::observation::{AncillarySeries, DiffractionObservation};

/// Validated observation with ascending radius and the derived geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedObservation {
    pub rho_km: Vec<Kilometer>,
    pub p_norm: Vec<f64>,
    /// Phase with the sign flipped to the kernel convention
    pub phase_rad: Vec<Radian>,
    pub b_rad: Vec<Radian>,
    pub d_km: Vec<Kilometer>,
    pub phi_rad: Vec<Radian>,
    pub f_sky_hz: Vec<f64>,
    /// Always positive
    pub rho_dot_kms: Vec<KmPerSec>,
    /// Ancillary series, zero-filled when the observation carried none
    pub ancillary: AncillarySeries,

    /// Sample spacing, positive (km)
    pub dx_km: Kilometer,
    pub mu: Vec<f64>,
    pub lambda_km: Vec<Kilometer>,
    /// Diffracted complex transmittance
    pub t_hat: Vec<Complex64>,
    /// Fresnel scale (km)
    pub f_km: Vec<Kilometer>,
    /// The input radius was descending and every array was reversed
    pub reversed: bool,
}

impl NormalizedObservation {
    pub fn len(&self) -> usize {
        self.rho_km.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rho_km.is_empty()
    }
}

type Validator = fn(&DiffractionObservation) -> Result<(), DiffrecError>;

const VALIDATORS: [Validator; 3] = [check_finite, check_lengths, check_physical_ranges];

/// Validate `obs` and derive the normalized arrays used by the reconstruction.
///
/// Arguments
/// -----------------
/// * `obs`: the caller's observation
/// * `res_km`: requested resolution, compared to the sample spacing
///
/// Return
/// ----------
/// * The normalized observation, or the first validation failure.
pub fn normalize_observation(
    obs: &DiffractionObservation,
    res_km: Kilometer,
) -> Result<NormalizedObservation, DiffrecError> {
    VALIDATORS.iter().try_for_each(|check| check(obs))?;

    let dx_km = check_sampling(&obs.rho_km, res_km)?;
    check_direction(&obs.rho_dot_kms)?;

    let reversed = dx_km < 0.0;
    let orient = |v: &[f64]| -> Vec<f64> {
        if reversed {
            v.iter().rev().copied().collect()
        } else {
            v.to_vec()
        }
    };

    let ancillary = obs
        .ancillary
        .as_ref()
        .map(|a| a.map(orient))
        .unwrap_or_else(|| AncillarySeries::zeros(obs.len()));

    let rho_km = orient(&obs.rho_km);
    let p_norm = orient(&obs.p_norm);
    let phase_rad: Vec<f64> = orient(&obs.phase_rad).into_iter().map(|p| -p).collect();
    let b_rad = orient(&obs.b_rad);
    let d_km = orient(&obs.d_km);
    let phi_rad = orient(&obs.phi_rad);
    let f_sky_hz = orient(&obs.f_sky_hz);
    let rho_dot_kms: Vec<f64> = orient(&obs.rho_dot_kms)
        .into_iter()
        .map(f64::abs)
        .collect();

    let mu = b_rad.iter().map(|b| b.abs().sin()).collect();
    let lambda_km: Vec<f64> = f_sky_hz.iter().map(|f| SPEED_OF_LIGHT_KM / f).collect();
    let t_hat = p_norm
        .iter()
        .zip(&phase_rad)
        .map(|(p, phase)| Complex64::from_polar(p.sqrt(), *phase))
        .collect();
    let f_km = itertools::izip!(&lambda_km, &d_km, &b_rad, &phi_rad)
        .map(|(lambda, d, b, phi)| fresnel_scale(*lambda, *d, *b, *phi))
        .collect();

    Ok(NormalizedObservation {
        rho_km,
        p_norm,
        phase_rad,
        b_rad,
        d_km,
        phi_rad,
        f_sky_hz,
        rho_dot_kms,
        ancillary,
        dx_km: dx_km.abs(),
        mu,
        lambda_km,
        t_hat,
        f_km,
        reversed,
    })
}

/// Fresnel scale `F = √( λD/2 · (1 − cos²B sin²φ) / sin²B )` (km).
pub fn fresnel_scale(lambda_km: Kilometer, d_km: Kilometer, b: Radian, phi: Radian) -> Kilometer {
    let (sb, cb) = b.sin_cos();
    let sp = phi.sin();
    (0.5 * lambda_km * d_km * (1.0 - cb * cb * sp * sp) / (sb * sb)).sqrt()
}

fn check_finite(obs: &DiffractionObservation) -> Result<(), DiffrecError> {
    let ancillary = obs.ancillary.as_ref().map(AncillarySeries::fields);

    obs.core_fields()
        .into_iter()
        .chain(ancillary.into_iter().flatten())
        .try_for_each(|(field, values)| {
            match values.iter().position(|v| !v.is_finite()) {
                Some(index) => Err(DiffrecError::NonRealInput {
                    field,
                    index,
                    value: values[index],
                }),
                None => Ok(()),
            }
        })
}

fn check_lengths(obs: &DiffractionObservation) -> Result<(), DiffrecError> {
    let n = obs.len();
    if n < 2 {
        return Err(DiffrecError::ArrayLengthMismatch(format!(
            "at least two samples are needed, rho_km has {n}"
        )));
    }

    let ancillary = obs.ancillary.as_ref().map(AncillarySeries::fields);

    obs.core_fields()
        .into_iter()
        .chain(ancillary.into_iter().flatten())
        .try_for_each(|(field, values)| {
            if values.len() == n {
                Ok(())
            } else {
                Err(DiffrecError::ArrayLengthMismatch(format!(
                    "{field} has {} samples, rho_km has {n}",
                    values.len()
                )))
            }
        })
}

fn check_physical_ranges(obs: &DiffractionObservation) -> Result<(), DiffrecError> {
    let out_of_range = |field: &str, index: usize, value: f64, rule: &str| {
        DiffrecError::ValueOutOfPhysicalRange(format!(
            "{field}[{index}] = {value} but {rule}"
        ))
    };

    if let Some((i, p)) = obs.p_norm.iter().find_position(|p| **p < 0.0) {
        return Err(out_of_range("p_norm", i, *p, "power must be non-negative"));
    }

    for (field, values) in [
        ("phase_rad", &obs.phase_rad),
        ("b_rad", &obs.b_rad),
        ("phi_rad", &obs.phi_rad),
    ] {
        if let Some((i, v)) = values.iter().find_position(|v| v.abs() > DPI + ANGLE_TOLERANCE) {
            return Err(out_of_range(
                field,
                i,
                *v,
                "angles must be in radians with magnitude at most 2π",
            ));
        }
    }

    if let Some((i, b)) = obs.b_rad.iter().find_position(|b| b.sin() == 0.0) {
        return Err(out_of_range(
            "b_rad",
            i,
            *b,
            "the ring opening angle must not vanish",
        ));
    }

    for (field, values) in [("d_km", &obs.d_km), ("f_sky_hz", &obs.f_sky_hz)] {
        if let Some((i, v)) = values.iter().find_position(|v| **v <= 0.0) {
            return Err(out_of_range(field, i, *v, "it must be strictly positive"));
        }
    }

    Ok(())
}

/// Signed sample spacing, after checking the resolution and the monotonicity of the radius.
fn check_sampling(rho_km: &[f64], res_km: Kilometer) -> Result<Kilometer, DiffrecError> {
    let dx = rho_km[1] - rho_km[0];
    if dx == 0.0 {
        return Err(DiffrecError::ValueOutOfPhysicalRange(format!(
            "rho_km must be strictly monotonic, first two samples are both {} km",
            rho_km[0]
        )));
    }

    if let Some((i, (a, b))) = rho_km
        .iter()
        .tuple_windows()
        .find_position(|(a, b)| (*b - *a) * dx.signum() <= 0.0)
    {
        return Err(DiffrecError::ValueOutOfPhysicalRange(format!(
            "rho_km must be strictly monotonic, rho_km[{i}] = {a} and rho_km[{}] = {b}",
            i + 1
        )));
    }

    if res_km < RESOLUTION_SAMPLING_FACTOR * dx.abs() {
        return Err(DiffrecError::InvalidResolution(format!(
            "resolution {res_km} km is finer than twice the sample spacing ({} km)",
            2.0 * dx.abs()
        )));
    }

    Ok(dx)
}

fn check_direction(rho_dot_kms: &[f64]) -> Result<(), DiffrecError> {
    match rho_dot_kms.iter().copied().minmax_by(f64::total_cmp) {
        MinMaxResult::MinMax(min, max) if min < 0.0 && max > 0.0 => {
            Err(DiffrecError::ChordOccultationUnsupported {
                min_rho_dot: min,
                max_rho_dot: max,
            })
        }
        _ => Ok(()),
    }
}
