//! # Reconstruction parameters
//!
//! [`ReconstructionParams`] gathers every knob of one diffraction reconstruction: requested
//! resolution, radial range, window and psi approximations, and the boolean switches of the
//! pipeline. It is built through [`ReconstructionParamsBuilder`], whose `build()` performs the
//! configuration-level checks before any observation data is looked at.
//!
//! Defaults
//! -----------------
//! * `range`: `all` (`[1, 400000]` km)
//! * `window_type`: `kb25`
//! * `psi_type`: `full`
//! * `forward_model`: `false`
//! * `normalize`: `true`
//! * `bfactor`: `true`
//! * `sigma`: `2e-13`
//! * `use_fft`: `false`
//! * `verbose`: `false`
//!
//! # Example
//!
//! ```rust
//! use diffrec::params::ReconstructionParams;
//! use diffrec::window_functions::WindowType;
//!
//! let params = ReconstructionParams::builder(1.0)
//!     .window_type(WindowType::Kb35)
//!     .psi_type_str("MTR4")
//!     .range_str("Maxwell Ringlet")
//!     .forward_model(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(params.range.bounds(), [87_410.0, 87_610.0]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{Kilometer, DEFAULT_SIGMA};
use crate::diffrec_errors::DiffrecError;
use crate::fresnel_kernel::PsiType;
use crate::region::RangeRequest;
use crate::window_functions::WindowType;

/// Configuration of one diffraction reconstruction.
///
/// See also
/// -----------------
/// * [`ReconstructionParams::builder`] – validating construction.
/// * [`crate::diffraction_correction::DiffractionCorrection::new`] – consumes these parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionParams {
    /// Requested radial resolution (km)
    pub res_km: Kilometer,
    /// Radial range to reconstruct
    pub range: RangeRequest,
    pub window_type: WindowType,
    pub psi_type: PsiType,
    /// Run the forward model on the reconstruction
    pub forward_model: bool,
    /// Divide by the free-space integral of the kernel
    pub normalize: bool,
    /// Widen the window for the oscillator phase noise (b-factor)
    pub bfactor: bool,
    /// Allan deviation of the oscillator
    pub sigma: f64,
    /// Evaluate the integral by FFT convolution instead of direct summation
    pub use_fft: bool,
    /// Raise progress messages to `info` level
    pub verbose: bool,
}

impl ReconstructionParams {
    /// Start a builder for a reconstruction at resolution `res_km`.
    pub fn builder(res_km: Kilometer) -> ReconstructionParamsBuilder {
        ReconstructionParamsBuilder::new(res_km)
    }

    /// Parameters with every default and the given resolution, validated.
    pub fn with_resolution(res_km: Kilometer) -> Result<Self, DiffrecError> {
        Self::builder(res_km).build()
    }

    /// Re-run the configuration checks of [`ReconstructionParamsBuilder::build`].
    ///
    /// Fields are public and the struct is deserializable, so the pipeline checks them again.
    pub fn validate(&self) -> Result<(), DiffrecError> {
        if !(self.res_km.is_finite() && self.res_km > 0.0) {
            return Err(DiffrecError::InvalidResolution(format!(
                "resolution must be a positive finite number of km, got {}",
                self.res_km
            )));
        }
        self.range.validate()?;
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(DiffrecError::InvalidSigma(self.sigma));
        }
        Ok(())
    }
}

/// Builder for [`ReconstructionParams`], with validation.
///
/// String setters keep their parse result until [`build`](Self::build), so the first
/// configuration error is reported there.
#[derive(Debug, Clone)]
pub struct ReconstructionParamsBuilder {
    params: ReconstructionParams,
    window_type: Result<WindowType, DiffrecError>,
    psi_type: Result<PsiType, DiffrecError>,
    range: Result<RangeRequest, DiffrecError>,
}

impl ReconstructionParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new(res_km: Kilometer) -> Self {
        Self {
            params: ReconstructionParams {
                res_km,
                range: RangeRequest::default(),
                window_type: WindowType::default(),
                psi_type: PsiType::default(),
                forward_model: false,
                normalize: true,
                bfactor: true,
                sigma: DEFAULT_SIGMA,
                use_fft: false,
                verbose: false,
            },
            window_type: Ok(WindowType::default()),
            psi_type: Ok(PsiType::default()),
            range: Ok(RangeRequest::default()),
        }
    }

    // --- Selectors ---
    pub fn window_type(mut self, v: WindowType) -> Self {
        self.window_type = Ok(v);
        self
    }
    pub fn window_type_str(mut self, v: &str) -> Self {
        self.window_type = v.parse();
        self
    }
    pub fn psi_type(mut self, v: PsiType) -> Self {
        self.psi_type = Ok(v);
        self
    }
    pub fn psi_type_str(mut self, v: &str) -> Self {
        self.psi_type = v.parse();
        self
    }

    // --- Range ---
    pub fn range(mut self, v: impl Into<RangeRequest>) -> Self {
        self.range = Ok(v.into());
        self
    }
    pub fn range_str(mut self, v: &str) -> Self {
        self.range = v.parse();
        self
    }
    pub fn range_values(mut self, v: &[f64]) -> Self {
        self.range = RangeRequest::from_values(v);
        self
    }

    // --- Switches ---
    pub fn forward_model(mut self, v: bool) -> Self {
        self.params.forward_model = v;
        self
    }
    pub fn normalize(mut self, v: bool) -> Self {
        self.params.normalize = v;
        self
    }
    pub fn bfactor(mut self, v: bool) -> Self {
        self.params.bfactor = v;
        self
    }
    pub fn sigma(mut self, v: f64) -> Self {
        self.params.sigma = v;
        self
    }
    pub fn use_fft(mut self, v: bool) -> Self {
        self.params.use_fft = v;
        self
    }
    pub fn verbose(mut self, v: bool) -> Self {
        self.params.verbose = v;
        self
    }

    /// Validate and return the parameters.
    ///
    /// Checks run in order: resolution, window type, psi type, range, sigma.
    pub fn build(self) -> Result<ReconstructionParams, DiffrecError> {
        let res = self.params.res_km;
        if !(res.is_finite() && res > 0.0) {
            return Err(DiffrecError::InvalidResolution(format!(
                "resolution must be a positive finite number of km, got {res}"
            )));
        }

        let params = ReconstructionParams {
            window_type: self.window_type?,
            psi_type: self.psi_type?,
            range: self.range?,
            ..self.params
        };

        if !(params.sigma.is_finite() && params.sigma > 0.0) {
            return Err(DiffrecError::InvalidSigma(params.sigma));
        }

        Ok(params)
    }
}

impl fmt::Display for ReconstructionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 36;
            writeln!(f, "Diffraction Reconstruction Parameters")?;
            writeln!(f, "-------------------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Resolution / range]")?;
            line!("res_km = {}", self.res_km, "Requested resolution (km)")?;
            line!("range = {}", self.range, "Radial range request")?;

            writeln!(f, "[Kernel]")?;
            line!("window_type = {}", self.window_type, "Tapering window")?;
            line!("psi_type = {}", self.psi_type, "Geometric phase approximation")?;
            line!("use_fft = {}", self.use_fft, "FFT convolution instead of sum")?;
            line!("normalize = {}", self.normalize, "Free-space normalization")?;

            writeln!(f, "[Window width]")?;
            line!("bfactor = {}", self.bfactor, "Oscillator noise correction")?;
            line!("sigma = {:e}", self.sigma, "Allan deviation")?;

            writeln!(f, "[Outputs]")?;
            line!("forward_model = {}", self.forward_model, "Forward model pass")?;
            line!("verbose = {}", self.verbose, "Progress at info level")?;

            Ok(())
        } else {
            write!(
                f,
                "ReconstructionParams(res={}km, range={}, window={}, psi={}, fwd={}, norm={}, bfac={}, sigma={:e}, fft={})",
                self.res_km,
                self.range,
                self.window_type,
                self.psi_type,
                self.forward_model,
                self.normalize,
                self.bfactor,
                self.sigma,
                self.use_fft,
            )
        }
    }
}
