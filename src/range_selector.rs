//! # Reconstruction range
//!
//! Select the contiguous block of samples that can be reconstructed. A sample qualifies when
//!
//! * a full window fits inside the data around it: `ρ ∈ [min ρ + ⌈Wmax/2⌉, max ρ − ⌈Wmax/2⌉]`,
//! * it lies inside the requested radial range.
//!
//! When the two constraints do not overlap, the failure says which edge is responsible.

use serde::{Deserialize, Serialize};

use crate::constants::Kilometer;
use crate::diffrec_errors::{DiffrecError, WindowShortfall};

/// Index block processed by the reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRange {
    /// First processed index
    pub start: usize,
    /// Last processed index (inclusive)
    pub finish: usize,
    /// `finish − start + 1`
    pub n_used: usize,
    /// Lowest radius allowed by window and request (km)
    pub rho_min: Kilometer,
    /// Highest radius allowed by window and request (km)
    pub rho_max: Kilometer,
}

impl ProcessingRange {
    /// Index range `start..=finish` as a half-open range.
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.n_used
    }
}

/// Compute the processed block.
///
/// Arguments
/// -----------------
/// * `rho_km`: ascending ring radii (km), at least one sample
/// * `w_km`: window width at each sample (km)
/// * `requested`: requested `[min, max]` radii (km)
///
/// Return
/// ----------
/// * The processed block, [`DiffrecError::InsufficientDataForWindow`] when no full window fits
///   the data or the request, or [`DiffrecError::RequestedRangeOutOfBounds`] when the request
///   misses the data entirely.
pub fn select_range(
    rho_km: &[Kilometer],
    w_km: &[Kilometer],
    requested: [Kilometer; 2],
) -> Result<ProcessingRange, DiffrecError> {
    let [req_min, req_max] = requested;
    let (data_min, data_max) = match (rho_km.first(), rho_km.last()) {
        (Some(a), Some(b)) => (*a, *b),
        _ => {
            return Err(WindowShortfall::EmptyRange {
                rho_min: req_min,
                rho_max: req_max,
            }
            .into())
        }
    };

    let w_max = w_km.iter().copied().fold(0.0, f64::max);
    let half = (w_max / 2.0).ceil();
    let rho_min_lim = data_min + half;
    let rho_max_lim = data_max - half;

    if rho_min_lim > data_max {
        return Err(WindowShortfall::DataShorterThanWindowStart {
            rho_min: data_min,
            rho_max: data_max,
            rho_min_lim,
        }
        .into());
    }
    if rho_max_lim < data_min {
        return Err(WindowShortfall::DataShorterThanWindowEnd {
            rho_min: data_min,
            rho_max: data_max,
            rho_max_lim,
        }
        .into());
    }
    if data_max < req_min || data_min > req_max {
        return Err(DiffrecError::RequestedRangeOutOfBounds {
            requested_min: req_min,
            requested_max: req_max,
            data_min,
            data_max,
        });
    }

    // both exist once the request overlaps the data
    let rho_start = rho_km
        .iter()
        .copied()
        .find(|r| *r >= req_min)
        .unwrap_or(data_min);
    let rho_end = rho_km
        .iter()
        .copied()
        .rfind(|r| *r <= req_max)
        .unwrap_or(data_max);

    let rho_min = rho_min_lim.max(rho_start);
    let rho_max = rho_max_lim.min(rho_end);

    if rho_min > rho_max {
        let starts_too_late = rho_min_lim > rho_end;
        let ends_too_early = rho_max_lim < rho_min;

        let cause = if starts_too_late && rho_max_lim > rho_min {
            WindowShortfall::WindowTooWideAtStart {
                rho_end,
                rho_min_lim,
            }
        } else if ends_too_early && rho_min_lim < rho_end {
            WindowShortfall::WindowTooWideAtEnd {
                rho_start,
                rho_max_lim,
            }
        } else if starts_too_late && ends_too_early {
            WindowShortfall::WindowTooWideAtBothEnds {
                rho_min_lim,
                rho_max_lim,
            }
        } else {
            WindowShortfall::EmptyRange { rho_min, rho_max }
        };
        return Err(cause.into());
    }

    let start = rho_km.iter().position(|r| *r >= rho_min);
    let finish = rho_km.iter().rposition(|r| *r <= rho_max);

    match (start, finish) {
        (Some(start), Some(finish)) if finish >= start => Ok(ProcessingRange {
            start,
            finish,
            n_used: finish - start + 1,
            rho_min,
            rho_max,
        }),
        _ => Err(WindowShortfall::EmptyRange { rho_min, rho_max }.into()),
    }
}
