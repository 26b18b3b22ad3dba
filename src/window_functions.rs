//! # Tapering windows for the Fresnel inversion
//!
//! Each [`WindowType`] maps a window width `W` (km) and a sample spacing `dx` (km) to an
//! odd-length taper of `2·⌊W/(2dx)⌋ + 1` samples centered on the reconstructed point, and
//! carries a **normalized equivalent width** (`normeq`) used to scale the window width so
//! that every taper achieves the requested resolution (MTR86 Eq. 20).
//!
//! | name     | taper                                         | normeq     |
//! |----------|-----------------------------------------------|------------|
//! | `rect`   | 1                                             | 1.00000000 |
//! | `coss`   | cos²(πx)                                      | 1.50000000 |
//! | `kb20`   | I0(2.0π√(1−4x²)) / I0(2.0π)                   | 1.49634231 |
//! | `kb25`   | I0(2.5π√(1−4x²)) / I0(2.5π)                   | 1.65191895 |
//! | `kb35`   | I0(3.5π√(1−4x²)) / I0(3.5π)                   | 1.92844639 |
//! | `kbmd20` | (I0(2.0π√(1−4x²)) − 1) / (I0(2.0π) − 1)       | 1.52048174 |
//! | `kbmd25` | (I0(2.5π√(1−4x²)) − 1) / (I0(2.5π) − 1)       | 1.65994218 |
//!
//! where `x = offset·dx / W` is the normalized distance from the window center, `|x| ≤ 1/2`.
//! Every taper equals exactly `1.0` at its center sample.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{IV0_20, IV0_25, IV0_35};
use crate::diffrec_errors::DiffrecError;
use crate::special_functions::bessel_i0;

/// Named tapering function applied to the Fresnel kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    Rect,
    Coss,
    Kb20,
    #[default]
    Kb25,
    Kb35,
    KbMd20,
    KbMd25,
}

impl WindowType {
    /// Every available window, in table order.
    pub const ALL: [WindowType; 7] = [
        WindowType::Rect,
        WindowType::Coss,
        WindowType::Kb20,
        WindowType::Kb25,
        WindowType::Kb35,
        WindowType::KbMd20,
        WindowType::KbMd25,
    ];

    /// Canonical lowercase name of the window.
    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Rect => "rect",
            WindowType::Coss => "coss",
            WindowType::Kb20 => "kb20",
            WindowType::Kb25 => "kb25",
            WindowType::Kb35 => "kb35",
            WindowType::KbMd20 => "kbmd20",
            WindowType::KbMd25 => "kbmd25",
        }
    }

    /// Normalized equivalent width of the taper.
    pub fn normeq(&self) -> f64 {
        match self {
            WindowType::Rect => 1.000_000_00,
            WindowType::Coss => 1.500_000_00,
            WindowType::Kb20 => 1.496_342_31,
            WindowType::Kb25 => 1.651_918_95,
            WindowType::Kb35 => 1.928_446_39,
            WindowType::KbMd20 => 1.520_481_74,
            WindowType::KbMd25 => 1.659_942_18,
        }
    }

    /// Number of samples of a window of width `width_km` sampled every `dx_km`.
    ///
    /// Always odd: `2·⌊width/(2dx)⌋ + 1`.
    pub fn sample_count(width_km: f64, dx_km: f64) -> usize {
        let half = (width_km / (2.0 * dx_km)).floor();
        if half.is_finite() && half > 0.0 {
            2 * half as usize + 1
        } else {
            1
        }
    }

    /// Evaluate the taper at one normalized offset `x` (`|x| ≤ 1/2`).
    #[inline]
    pub fn value_at(&self, x: f64) -> f64 {
        // |x| is at most 1/2 by construction, round-off can push 1 - 4x² just below zero
        let arg = (1.0 - 4.0 * x * x).max(0.0).sqrt();
        match self {
            WindowType::Rect => 1.0,
            WindowType::Coss => {
                let c = (std::f64::consts::PI * x).cos();
                c * c
            }
            WindowType::Kb20 => bessel_i0(2.0 * std::f64::consts::PI * arg) / IV0_20,
            WindowType::Kb25 => bessel_i0(2.5 * std::f64::consts::PI * arg) / IV0_25,
            WindowType::Kb35 => bessel_i0(3.5 * std::f64::consts::PI * arg) / IV0_35,
            WindowType::KbMd20 => {
                (bessel_i0(2.0 * std::f64::consts::PI * arg) - 1.0) / (IV0_20 - 1.0)
            }
            WindowType::KbMd25 => {
                (bessel_i0(2.5 * std::f64::consts::PI * arg) - 1.0) / (IV0_25 - 1.0)
            }
        }
    }

    /// Sample the taper for a window of width `width_km` with spacing `dx_km`.
    ///
    /// Arguments
    /// -----------------
    /// * `width_km`: window width (km)
    /// * `dx_km`: sample spacing (km), strictly positive
    ///
    /// Return
    /// ----------
    /// * The odd-length taper, center sample at index `(nw - 1) / 2`.
    pub fn evaluate(&self, width_km: f64, dx_km: f64) -> Vec<f64> {
        let nw = Self::sample_count(width_km, dx_km);
        let half = ((nw - 1) / 2) as f64;

        (0..nw)
            .map(|k| {
                if k as f64 == half {
                    // exact at the center whatever the Bessel round-off
                    return 1.0;
                }
                let x = (k as f64 - half) * dx_km / width_km;
                self.value_at(x)
            })
            .collect()
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase `s` and drop whitespace and quote characters.
pub(crate) fn canonical_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for WindowType {
    type Err = DiffrecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = canonical_key(s);
        WindowType::ALL
            .into_iter()
            .find(|w| w.name() == key)
            .ok_or(DiffrecError::UnknownWindowType(key))
    }
}
