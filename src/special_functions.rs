//! Special functions needed by the window library and the window-width solver.
//!
//! * [`bessel_i0`] – modified Bessel function of the first kind, order 0, evaluated by its
//!   power series (the Kaiser-Bessel arguments never exceed 3.5π, where the series converges
//!   in a few dozen terms to full double precision).
//! * [`lambert_w0`] – principal branch of the Lambert W function, solved by Halley iteration
//!   from a branch-point series seed near `-1/e` and a logarithmic seed elsewhere.

use std::f64::consts::E;

use crate::constants::RCPR_E;

/// Modified Bessel function of the first kind, order 0.
///
/// Arguments
/// -----------------
/// * `x`: real argument
///
/// Return
/// ----------
/// * `I0(x) = Σ ((x/2)^k / k!)²`
pub fn bessel_i0(x: f64) -> f64 {
    const KMAX: usize = 500;

    let y = 0.25 * x * x;
    let mut term = 1.0;
    let mut sum = 1.0;

    for k in 1..=KMAX {
        let kf = k as f64;
        term *= y / (kf * kf);
        sum += term;
        if term < sum * f64::EPSILON {
            break;
        }
    }

    sum
}

/// Principal branch `W0` of the Lambert W function, solution of `w·e^w = x` with `w ≥ -1`.
///
/// Arguments
/// -----------------
/// * `x`: real argument, `x ≥ -1/e`
///
/// Return
/// ----------
/// * `W0(x)`, or `NaN` when `x < -1/e` or `x` is not a number (the real principal branch is
///   undefined there).
pub fn lambert_w0(x: f64) -> f64 {
    const ITMAX: usize = 64;

    if x.is_nan() || x < -RCPR_E {
        return f64::NAN;
    }
    if x == -RCPR_E {
        return -1.0;
    }
    if x == 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return f64::INFINITY;
    }

    let mut w = if x < -0.25 {
        // Series about the branch point in p = sqrt(2(e·x + 1))
        let p = (2.0 * (E * x + 1.0)).max(0.0).sqrt();
        -1.0 + p * (1.0 + p * (-1.0 / 3.0 + p * 11.0 / 72.0))
    } else if x < 3.0 {
        x.ln_1p()
    } else {
        let l1 = x.ln();
        l1 - l1.ln()
    };

    for _ in 0..ITMAX {
        let ew = w.exp();
        let f = w * ew - x;
        let wp1 = w + 1.0;
        if wp1 == 0.0 {
            break;
        }
        let denom = ew * wp1 - (w + 2.0) * f / (2.0 * wp1);
        if denom == 0.0 || !denom.is_finite() {
            break;
        }
        let dw = f / denom;
        w -= dw;
        if dw.abs() <= 4.0 * f64::EPSILON * (1.0 + w.abs()) {
            break;
        }
    }

    w
}

#[cfg(test)]
mod special_functions_test {
    use super::*;
    use crate::constants::{IV0_20, IV0_25, IV0_35};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_bessel_i0_reference_values() {
        assert_eq!(bessel_i0(0.0), 1.0);
        assert_relative_eq!(bessel_i0(1.0), 1.266_065_877_752_008_4, max_relative = 1e-14);
        assert_relative_eq!(bessel_i0(-1.0), bessel_i0(1.0), max_relative = 1e-15);
    }

    #[test]
    fn test_bessel_i0_kaiser_constants() {
        // the tabulated normalizations are ~1e-7 off the exact values
        assert_relative_eq!(bessel_i0(2.0 * PI), IV0_20, max_relative = 1e-6);
        assert_relative_eq!(bessel_i0(2.5 * PI), IV0_25, max_relative = 1e-6);
        assert_relative_eq!(bessel_i0(3.5 * PI), IV0_35, max_relative = 1e-6);
        assert_relative_eq!(bessel_i0(2.0 * PI), 87.108_510_653_390_81, max_relative = 1e-13);
    }

    #[test]
    fn test_lambert_w0_identity() {
        for &x in &[-0.367, -0.3, -0.2, -0.05, 1e-6, 0.5, 1.0, 2.5, 10.0, 1e4] {
            let w = lambert_w0(x);
            assert_relative_eq!(w * w.exp(), x, max_relative = 1e-12);
            assert!(w >= -1.0);
        }
    }

    #[test]
    fn test_lambert_w0_special_points() {
        assert_eq!(lambert_w0(0.0), 0.0);
        assert_eq!(lambert_w0(-RCPR_E), -1.0);
        assert_relative_eq!(lambert_w0(E), 1.0, max_relative = 1e-14);
        assert_relative_eq!(lambert_w0(1.0), 0.567_143_290_409_783_8, max_relative = 1e-14);
    }

    #[test]
    fn test_lambert_w0_outside_domain() {
        assert!(lambert_w0(-0.5).is_nan());
        assert!(lambert_w0(f64::NAN).is_nan());
    }

    #[test]
    fn test_lambert_w0_near_branch_point() {
        let x = -RCPR_E + 1e-10;
        let w = lambert_w0(x);
        assert!(w > -1.0 && w < -0.99);
        assert_relative_eq!(w * w.exp(), x, max_relative = 1e-9);
    }
}
