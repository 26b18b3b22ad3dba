//! # Constants and type definitions for diffrec
//!
//! This module centralizes the **physical constants**, **numerical tolerances**, and **common
//! type aliases** used throughout the reconstruction pipeline.
//!
//! ## Overview
//!
//! - Physical constants (speed of light) and multiples of π
//! - Precomputed values of the modified Bessel function `I0` used by the Kaiser-Bessel windows
//! - Validation tolerances (angle bound, resolution sampling factor)
//! - Newton-Raphson controls for the stationary-phase search
//! - Unit type aliases used in public signatures

// -------------------------------------------------------------------------------------------------
// Physical constants
// -------------------------------------------------------------------------------------------------

/// Speed of light in km/s
pub const SPEED_OF_LIGHT_KM: f64 = 299_792.458_0;

/// 2π
pub const DPI: f64 = 2.0 * std::f64::consts::PI;

/// π/2
pub const HALF_PI: f64 = std::f64::consts::FRAC_PI_2;

/// 1/e, the branch point of the Lambert W function (taken with a minus sign)
pub const RCPR_E: f64 = 0.367_879_441_171_442_3;

/// √2
pub const SQRT_2: f64 = std::f64::consts::SQRT_2;

// -------------------------------------------------------------------------------------------------
// Kaiser-Bessel normalizations: I0(α) for α = 2.0π, 2.5π, 3.5π
// -------------------------------------------------------------------------------------------------
// Reference values of the legacy window tables, within ~1e-7 of the exact I0(α).

/// Reference normalization I0(2.0π), accurate to ~1e-7
pub const IV0_20: f64 = 87.108_502_096_279_4;

/// Reference normalization I0(2.5π), accurate to ~1e-7
pub const IV0_25: f64 = 373.020_584_990_374_86;

/// Reference normalization I0(3.5π), accurate to ~1e-7
pub const IV0_35: f64 = 7_257.799_492_304_176;

// -------------------------------------------------------------------------------------------------
// Validation and numerical controls
// -------------------------------------------------------------------------------------------------

/// Slack added to 2π when checking that angles are given in radians
pub const ANGLE_TOLERANCE: f64 = 1.0e-8;

/// The resolution must be at least this multiple of the sample spacing (2·dx with round-off slack)
pub const RESOLUTION_SAMPLING_FACTOR: f64 = 1.999_999;

/// Below this distance from the Lambert W branch point the window width falls back to `2F²/res`
pub const BFACTOR_BRANCH_EPS: f64 = 1.0e-16;

/// Convergence threshold on the stationary azimuth update (radians)
pub const NEWTON_EPS: f64 = 1.0e-10;

/// Iteration cap of the stationary-phase Newton-Raphson loop
pub const NEWTON_MAX_ITER: usize = 5;

/// Default Allan deviation (Cassini USO, 1 s integration)
pub const DEFAULT_SIGMA: f64 = 2.0e-13;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Distance in kilometers
pub type Kilometer = f64;
/// Angle in radians
pub type Radian = f64;
/// Frequency in hertz
pub type Hertz = f64;
/// Velocity in kilometers per second
pub type KmPerSec = f64;
