//! # Radial ranges requested for reconstruction
//!
//! A reconstruction range is either an explicit `[a, b]` interval in kilometers or one of the
//! named regions of interest of the Saturnian ring system listed below. Names are matched
//! regardless of case, whitespace, or quotes; aliases map to the same region.
//!
//! | name(s)                           | range (km)           |
//! |-----------------------------------|----------------------|
//! | `all`                             | [1, 400000]          |
//! | `cringripples`                    | [77690, 77760]       |
//! | `encke`, `enckegap`               | [132900, 134200]     |
//! | `janusepimetheus`                 | [96200, 96800]       |
//! | `maxwell`, `maxwellringlet`       | [87410, 87610]       |
//! | `titan`, `titanringlet`           | [77870, 77930]       |
//! | `huygens`, `huygensringlet`       | [117650, 117950]     |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::Kilometer;
use crate::diffrec_errors::DiffrecError;
use crate::window_functions::canonical_key;

/// Named region of interest within the rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    All,
    CRingRipples,
    Encke,
    JanusEpimetheus,
    Maxwell,
    Titan,
    Huygens,
}

/// Lookup table: accepted name → region. Immutable, module scoped.
static REGION_NAMES: [(&str, Region); 11] = [
    ("all", Region::All),
    ("cringripples", Region::CRingRipples),
    ("encke", Region::Encke),
    ("enckegap", Region::Encke),
    ("janusepimetheus", Region::JanusEpimetheus),
    ("maxwell", Region::Maxwell),
    ("maxwellringlet", Region::Maxwell),
    ("titan", Region::Titan),
    ("titanringlet", Region::Titan),
    ("huygens", Region::Huygens),
    ("huygensringlet", Region::Huygens),
];

impl Region {
    /// Radial bounds `[min, max]` of the region (km).
    pub fn bounds(&self) -> [Kilometer; 2] {
        match self {
            Region::All => [1.0, 400_000.0],
            Region::CRingRipples => [77_690.0, 77_760.0],
            Region::Encke => [132_900.0, 134_200.0],
            Region::JanusEpimetheus => [96_200.0, 96_800.0],
            Region::Maxwell => [87_410.0, 87_610.0],
            Region::Titan => [77_870.0, 77_930.0],
            Region::Huygens => [117_650.0, 117_950.0],
        }
    }

    /// Canonical name of the region.
    pub fn name(&self) -> &'static str {
        match self {
            Region::All => "all",
            Region::CRingRipples => "cringripples",
            Region::Encke => "encke",
            Region::JanusEpimetheus => "janusepimetheus",
            Region::Maxwell => "maxwell",
            Region::Titan => "titan",
            Region::Huygens => "huygens",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = DiffrecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = canonical_key(s);
        REGION_NAMES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, region)| *region)
            .ok_or_else(|| {
                let allowed: Vec<&str> = REGION_NAMES.iter().map(|(n, _)| *n).collect();
                DiffrecError::InvalidRangeSpec(format!(
                    "unknown region '{key}', allowed: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// Radial range requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RangeRequest {
    Region(Region),
    /// Normalized `[min, max]` interval (km)
    Explicit([Kilometer; 2]),
}

impl Default for RangeRequest {
    fn default() -> Self {
        RangeRequest::Region(Region::All)
    }
}

impl RangeRequest {
    /// Build an explicit range from any collection of at least two radii.
    ///
    /// The range is normalized to `[min, max]` of the given values.
    ///
    /// Arguments
    /// -----------------
    /// * `values`: radii in km (at least two, all finite, minimum non-negative)
    ///
    /// Return
    /// ----------
    /// * The normalized request or [`DiffrecError::InvalidRangeSpec`].
    pub fn from_values(values: &[f64]) -> Result<Self, DiffrecError> {
        if values.len() < 2 {
            return Err(DiffrecError::InvalidRangeSpec(format!(
                "an explicit range needs two numbers [a, b], got {}",
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(DiffrecError::InvalidRangeSpec(format!(
                "range values must be finite, got {bad}"
            )));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if min < 0.0 {
            return Err(DiffrecError::InvalidRangeSpec(format!(
                "minimum requested range must be non-negative, got {min} km"
            )));
        }

        Ok(RangeRequest::Explicit([min, max]))
    }

    /// Radial bounds `[min, max]` (km) this request stands for.
    pub fn bounds(&self) -> [Kilometer; 2] {
        match self {
            RangeRequest::Region(region) => region.bounds(),
            RangeRequest::Explicit(bounds) => *bounds,
        }
    }

    /// Re-check an already built request (explicit bounds may have been deserialized).
    pub(crate) fn validate(&self) -> Result<(), DiffrecError> {
        match self {
            RangeRequest::Region(_) => Ok(()),
            RangeRequest::Explicit(bounds) => Self::from_values(bounds).map(|_| ()),
        }
    }
}

impl FromStr for RangeRequest {
    type Err = DiffrecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Region>().map(RangeRequest::Region)
    }
}

impl From<Region> for RangeRequest {
    fn from(region: Region) -> Self {
        RangeRequest::Region(region)
    }
}

impl fmt::Display for RangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeRequest::Region(region) => write!(f, "{region}"),
            RangeRequest::Explicit([a, b]) => write!(f, "[{a}, {b}]"),
        }
    }
}
