//! # Geometric phase of the Fresnel kernel
//!
//! The Fresnel kernel of a ring occultation is `exp(∓iψ)` where the geometric phase is
//! (MTR86 Eq. 4)
//!
//! ```text
//! ψ  = kD · ( √(1 + 2ξ + η) − (1 + ξ) )
//! ξ  = (cos B / D) · (ρ0 cos φ0 − ρ cos φ)
//! η  = (ρ0² + ρ² − 2ρρ0 cos(φ − φ0)) / D²
//! ```
//!
//! with `ρ0, φ0` the ring-intercept radius and azimuth of the reconstructed point, `ρ` the
//! radius of a point inside the window and `φ` its azimuth. The integral is evaluated at the
//! **stationary azimuth** `φs` where `∂ψ/∂φ = 0`, found by Newton-Raphson.
//!
//! This module provides:
//!
//! * [`PsiType`] – the approximation used to evaluate ψ inside a window,
//! * [`PointGeometry`] – per-point constants (`kD`, `cos B / D`, `D²`, `cos φ0`, `sin φ0`),
//! * the full ψ, its first and second φ-derivatives and one Newton step,
//! * the quartic fit of ψ on the window quarter points (`mtr4`),
//! * the quadratic Fresnel approximation `ψ = π/2 · (Δρ/F)²`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{Kilometer, Radian, HALF_PI};
use crate::diffrec_errors::DiffrecError;
use crate::window_functions::canonical_key;

/// Approximation of the geometric phase ψ used inside each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PsiType {
    /// Quadratic `π/2·(Δρ/F)²`, no stationary-phase search.
    Fresnel,
    /// Full stationary-phase ψ.
    #[default]
    Full,
    /// Accepted for compatibility, evaluated as [`PsiType::Full`].
    Mtr2,
    /// Accepted for compatibility, evaluated as [`PsiType::Full`].
    Mtr3,
    /// Quartic polynomial fitted to the full ψ at the window quarter points.
    Mtr4,
}

impl PsiType {
    pub const ALL: [PsiType; 5] = [
        PsiType::Fresnel,
        PsiType::Full,
        PsiType::Mtr2,
        PsiType::Mtr3,
        PsiType::Mtr4,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PsiType::Fresnel => "fresnel",
            PsiType::Full => "full",
            PsiType::Mtr2 => "mtr2",
            PsiType::Mtr3 => "mtr3",
            PsiType::Mtr4 => "mtr4",
        }
    }

    /// Whether this approximation needs the stationary azimuth.
    pub fn needs_stationary_phase(&self) -> bool {
        !matches!(self, PsiType::Fresnel)
    }
}

impl fmt::Display for PsiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PsiType {
    type Err = DiffrecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = canonical_key(s);
        PsiType::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or(DiffrecError::UnknownPsiType(key))
    }
}

/// Constants of the phase function attached to one reconstructed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointGeometry {
    /// Ring-intercept radius ρ0 (km)
    pub r0: Kilometer,
    /// Wavenumber × distance, `2πD/λ`
    pub kd: f64,
    /// `cos B / D` (1/km)
    pub cbd: f64,
    /// `D²` (km²)
    pub d2: f64,
    pub cos_phi0: f64,
    pub sin_phi0: f64,
    /// First-order stationary azimuth shift per unit `(ρ − ρ0)/ρ0`
    pub dphi_fac: f64,
}

impl PointGeometry {
    /// Build the constants of one point.
    ///
    /// Arguments
    /// -----------------
    /// * `r0`: ring radius (km)
    /// * `phi0`: ring azimuth (rad)
    /// * `b`: ring opening angle (rad)
    /// * `d`: spacecraft to ring-intercept distance (km)
    /// * `lambda`: wavelength (km)
    pub fn new(r0: Kilometer, phi0: Radian, b: Radian, d: Kilometer, lambda: Kilometer) -> Self {
        let cos_b = b.cos();
        let cos_b2 = cos_b * cos_b;
        let (sin_phi0, cos_phi0) = phi0.sin_cos();

        PointGeometry {
            r0,
            kd: std::f64::consts::TAU * d / lambda,
            cbd: cos_b / d,
            d2: d * d,
            cos_phi0,
            sin_phi0,
            dphi_fac: cos_b2 * cos_phi0 * sin_phi0 / (1.0 - cos_b2 * sin_phi0 * sin_phi0),
        }
    }

    /// Full ψ at radius `r` and azimuth `phi`.
    #[inline]
    pub fn psi(&self, r: Kilometer, phi: Radian) -> f64 {
        let (sp, cp) = phi.sin_cos();
        let xi = self.cbd * (self.r0 * self.cos_phi0 - r * cp);
        let eta = (self.r0 * self.r0 + r * r
            - 2.0 * r * self.r0 * (sp * self.sin_phi0 + cp * self.cos_phi0))
            / self.d2;
        self.kd * ((1.0 + 2.0 * xi + eta).sqrt() - (1.0 + xi))
    }

    /// First and second partial derivatives of ψ/kD with respect to φ.
    ///
    /// The common `kD` factor is dropped since only their ratio is used.
    #[inline]
    pub fn psi_derivatives(&self, r: Kilometer, phi: Radian) -> (f64, f64) {
        let (sp, cp) = phi.sin_cos();
        let r0 = self.r0;
        let rcbd = r * self.cbd;

        let xi = self.cbd * (r0 * self.cos_phi0 - r * cp);
        let eta = (r0 * r0 + r * r - 2.0 * r * r0 * (sp * self.sin_phi0 + cp * self.cos_phi0))
            / self.d2;

        let v1 = rcbd * sp;
        let v2 = 2.0 * r * r0 * (sp * self.cos_phi0 - self.sin_phi0 * cp) / self.d2;
        let v3 = (1.0 + 2.0 * xi + eta).sqrt();
        let v4 = rcbd * cp;
        let v5 = 2.0 * r * r0 * (sp * self.sin_phi0 + cp * self.cos_phi0) / self.d2;

        let u = 2.0 * v1 + v2;
        let dphia = (2.0 * v4 + v5) / (2.0 * v3);
        let dphib = v4 + u * u / (4.0 * v3 * v3 * v3);

        (u / (2.0 * v3) - v1, dphia - dphib)
    }

    /// Newton-Raphson correction `Δφ = −ψ' / ψ''` at `(r, phi)`.
    #[inline]
    pub fn newton_step(&self, r: Kilometer, phi: Radian) -> Radian {
        let (d1, d2) = self.psi_derivatives(r, phi);
        -d1 / d2
    }

    /// First-order estimate of the stationary azimuth at radius `r`, used to seed a fresh window.
    #[inline]
    pub fn perturbed_azimuth(&self, phi0: Radian, r: Kilometer) -> (Radian, Radian) {
        let dphi = self.dphi_fac * (r - self.r0) / self.r0;
        (phi0 - dphi, dphi)
    }
}

/// Coefficients `[c1, c2, c3, c4]` of `ψ(x) ≈ c1·x + c2·x² + c3·x³ + c4·x⁴` through the window
/// edges and the samples closest to the quarter points.
///
/// Arguments
/// -----------------
/// * `x`: window offsets `ρ − ρ0` (km), ascending
/// * `psi_full`: full ψ at each offset
///
/// Return
/// ----------
/// * `None` when the window has fewer than five samples (quarter points collapse onto the edges).
pub fn quartic_coefficients(x: &[f64], psi_full: &[f64]) -> Option<[f64; 4]> {
    let nw = x.len();
    if nw < 5 || psi_full.len() != nw {
        return None;
    }

    let w = x[nw - 1] - x[0];
    let n2 = x.iter().position(|&xi| xi >= -w / 4.0)?;
    let n3 = x.iter().rposition(|&xi| xi <= w / 4.0)?;
    let (n1, n4) = (0, nw - 1);

    let d_psi_half = psi_full[n3] - psi_full[n2];
    let d_psi_full = psi_full[n4] - psi_full[n1];
    let a_psi_half = 0.5 * (psi_full[n3] + psi_full[n2]);
    let a_psi_full = 0.5 * (psi_full[n1] + psi_full[n4]);

    let (w2, w3) = (w * w, w * w * w);
    Some([
        (8.0 * d_psi_half - d_psi_full) / (3.0 * w),
        4.0 * (16.0 * a_psi_half - a_psi_full) / (3.0 * w2),
        16.0 * (d_psi_full - 2.0 * d_psi_half) / (3.0 * w3),
        64.0 * (a_psi_full - 4.0 * a_psi_half) / (3.0 * w3 * w),
    ])
}

/// Evaluate the quartic `c1·x + c2·x² + c3·x³ + c4·x⁴`.
#[inline]
pub fn quartic_psi(c: &[f64; 4], x: f64) -> f64 {
    (c[0] + c[1] * x) * x + (c[2] + c[3] * x) * x * x * x
}

/// Quadratic Fresnel approximation `ψ = π/2 · (x/F)²`.
#[inline]
pub fn fresnel_psi(x: Kilometer, f_km: Kilometer) -> f64 {
    HALF_PI * x * x / (f_km * f_km)
}

#[cfg(test)]
mod fresnel_kernel_test {
    use super::*;
    use approx::assert_relative_eq;

    fn saturn_point() -> PointGeometry {
        // X band, ~2.3e5 km slant distance, B = 0.5 rad
        let lambda = crate::constants::SPEED_OF_LIGHT_KM / 8.427e9;
        PointGeometry::new(87_500.0, 1.2, 0.5, 2.3e5, lambda)
    }

    #[test]
    fn test_psi_type_parse() {
        assert_eq!("MTR4".parse::<PsiType>().unwrap(), PsiType::Mtr4);
        assert_eq!(" Fresnel ".parse::<PsiType>().unwrap(), PsiType::Fresnel);
        assert_eq!(
            "legendre".parse::<PsiType>(),
            Err(DiffrecError::UnknownPsiType("legendre".into()))
        );
        assert!(!PsiType::Fresnel.needs_stationary_phase());
        assert!(PsiType::Mtr3.needs_stationary_phase());
    }

    #[test]
    fn test_psi_vanishes_at_center() {
        let g = saturn_point();
        assert_relative_eq!(g.psi(g.r0, 1.2), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let g = saturn_point();
        let (r, phi, h) = (87_503.0, 1.19, 1e-5);
        let (d1, d2) = g.psi_derivatives(r, phi);

        let f = |p: f64| g.psi(r, p) / g.kd;
        let fd1 = (f(phi + h) - f(phi - h)) / (2.0 * h);
        let fd2 = (f(phi + h) - 2.0 * f(phi) + f(phi - h)) / (h * h);

        assert_relative_eq!(d1, fd1, max_relative = 1e-5, epsilon = 1e-12);
        assert_relative_eq!(d2, fd2, max_relative = 1e-3);
    }

    #[test]
    fn test_newton_converges_to_stationary_azimuth() {
        let g = saturn_point();
        let r = 87_510.0;
        let (mut phi, _) = g.perturbed_azimuth(1.2, r);
        for _ in 0..10 {
            phi += g.newton_step(r, phi);
        }
        let (d1, _) = g.psi_derivatives(r, phi);
        assert!(d1.abs() < 1e-12, "residual derivative {d1}");
    }

    #[test]
    fn test_stationary_psi_is_close_to_fresnel_quadratic() {
        // Near the center the stationary ψ reduces to π/2·(Δρ/F)²
        let lambda = crate::constants::SPEED_OF_LIGHT_KM / 8.427e9;
        let (b, phi0, d) = (0.5_f64, 1.2_f64, 2.3e5_f64);
        let g = PointGeometry::new(87_500.0, phi0, b, d, lambda);
        let f_km = (0.5 * lambda * d * (1.0 - b.cos().powi(2) * phi0.sin().powi(2))
            / b.sin().powi(2))
        .sqrt();

        let r = 87_500.0 + 0.5 * f_km;
        let (mut phi, _) = g.perturbed_azimuth(phi0, r);
        for _ in 0..10 {
            phi += g.newton_step(r, phi);
        }
        assert_relative_eq!(g.psi(r, phi), fresnel_psi(r - g.r0, f_km), max_relative = 1e-3);
    }

    #[test]
    fn test_quartic_reproduces_quartic() {
        let c = [0.3, -1.2, 0.05, 0.01];
        let x: Vec<f64> = (-4..=4).map(|k| k as f64).collect();
        let psi: Vec<f64> = x.iter().map(|&xi| quartic_psi(&c, xi)).collect();
        let fit = quartic_coefficients(&x, &psi).unwrap();
        for k in 0..4 {
            assert_relative_eq!(fit[k], c[k], max_relative = 1e-12);
        }
    }

    #[test]
    fn test_quartic_matches_general_linear_solve() {
        use nalgebra::{Matrix4, Vector4};

        let x: Vec<f64> = (-8..=8).map(|k| 0.5 * k as f64).collect();
        let psi: Vec<f64> = x.iter().map(|&xi| (0.7 * xi).sin() + 0.2 * xi * xi).collect();
        let fit = quartic_coefficients(&x, &psi).unwrap();

        // edges at ±4, quarter points at ±2
        let nodes = [0usize, 4, 12, 16];
        let a = Matrix4::from_fn(|i, j| x[nodes[i]].powi(j as i32 + 1));
        let b = Vector4::from_fn(|i, _| psi[nodes[i]]);
        let sol = a.lu().solve(&b).unwrap();

        for k in 0..4 {
            assert_relative_eq!(fit[k], sol[k], max_relative = 1e-10, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_quartic_needs_five_samples() {
        assert!(quartic_coefficients(&[-1.0, 0.0, 1.0], &[1.0, 0.0, 1.0]).is_none());
    }

    #[test]
    fn test_fresnel_psi() {
        assert_eq!(fresnel_psi(0.0, 1.5), 0.0);
        assert_relative_eq!(fresnel_psi(2.0, 2.0), HALF_PI, max_relative = 1e-15);
    }
}
