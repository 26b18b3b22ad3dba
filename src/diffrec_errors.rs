use thiserror::Error;

use crate::constants::Kilometer;

/// Why the processed radial range ended up empty once the window half-width
/// and the requested range were combined.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowShortfall {
    #[error(
        "data spans [{rho_min}, {rho_max}] km but the first point with a full window is {rho_min_lim} km"
    )]
    DataShorterThanWindowStart {
        rho_min: Kilometer,
        rho_max: Kilometer,
        rho_min_lim: Kilometer,
    },

    #[error(
        "data spans [{rho_min}, {rho_max}] km but the last point with a full window is {rho_max_lim} km"
    )]
    DataShorterThanWindowEnd {
        rho_min: Kilometer,
        rho_max: Kilometer,
        rho_max_lim: Kilometer,
    },

    #[error(
        "requested range ends at {rho_end} km, before the first point with a full window ({rho_min_lim} km); \
         request a range that starts later or use a coarser resolution"
    )]
    WindowTooWideAtStart {
        rho_end: Kilometer,
        rho_min_lim: Kilometer,
    },

    #[error(
        "requested range starts at {rho_start} km, after the last point with a full window ({rho_max_lim} km); \
         request a range that ends earlier or use a coarser resolution"
    )]
    WindowTooWideAtEnd {
        rho_start: Kilometer,
        rho_max_lim: Kilometer,
    },

    #[error(
        "window is wider than the available data at both ends: first full-window point {rho_min_lim} km, \
         last full-window point {rho_max_lim} km"
    )]
    WindowTooWideAtBothEnds {
        rho_min_lim: Kilometer,
        rho_max_lim: Kilometer,
    },

    #[error("no point in [{rho_min}, {rho_max}] km can be reconstructed with the current window")]
    EmptyRange {
        rho_min: Kilometer,
        rho_max: Kilometer,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffrecError {
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Unknown window type '{0}', allowed: rect, coss, kb20, kb25, kb35, kbmd20, kbmd25")]
    UnknownWindowType(String),

    #[error("Unknown psi type '{0}', allowed: fresnel, full, mtr2, mtr3, mtr4")]
    UnknownPsiType(String),

    #[error("Invalid range specification: {0}")]
    InvalidRangeSpec(String),

    #[error("Allan deviation sigma must be a positive finite number, got {0}")]
    InvalidSigma(f64),

    #[error("Array length mismatch: {0}")]
    ArrayLengthMismatch(String),

    #[error("Non-real value in {field} at index {index}: {value}")]
    NonRealInput {
        field: &'static str,
        index: usize,
        value: f64,
    },

    #[error("Value out of physical range: {0}")]
    ValueOutOfPhysicalRange(String),

    #[error(
        "rho_dot_kms takes both signs (min {min_rho_dot}, max {max_rho_dot} km/s): chord occultation, \
         process ingress and egress separately"
    )]
    ChordOccultationUnsupported {
        min_rho_dot: f64,
        max_rho_dot: f64,
    },

    #[error(
        "b-factor window width is undefined: min(res / (alpha·F²)) = {min_p} must exceed 1 \
         (resolution too fine, sigma too large or rho_dot too small)"
    )]
    BFactorSingularity { min_p: f64 },

    #[error("Insufficient data for window: {0}")]
    InsufficientDataForWindow(WindowShortfall),

    #[error(
        "Requested range [{requested_min}, {requested_max}] km lies outside the data [{data_min}, {data_max}] km"
    )]
    RequestedRangeOutOfBounds {
        requested_min: Kilometer,
        requested_max: Kilometer,
        data_min: Kilometer,
        data_max: Kilometer,
    },
}

impl From<WindowShortfall> for DiffrecError {
    fn from(cause: WindowShortfall) -> Self {
        DiffrecError::InsufficientDataForWindow(cause)
    }
}
