//! # Diffraction correction
//!
//! [`DiffractionCorrection::new`] runs the whole reconstruction of a diffraction-limited ring
//! profile and returns an immutable result:
//!
//! 1. validate the parameters and the observation, normalize the sample direction and derive
//!    the geometry ([`crate::validation`]),
//! 2. compute the window width at every sample ([`crate::window_width`]),
//! 3. select the block of samples that can be reconstructed ([`crate::range_selector`]),
//! 4. invert the Fresnel transform over that block, and forward-model the reconstruction
//!    again when asked ([`crate::fresnel_transform`]),
//! 5. derive power, phase and optical depth, trim every array to the block and record the
//!    provenance ([`crate::result_finalizer`]).
//!
//! Every failure is reported before the sweep starts; the sweep itself cannot fail.
//!
//! # Example
//!
//! ```rust,no_run
//! use diffrec::diffraction_correction::DiffractionCorrection;
//! use diffrec::observation::DiffractionObservation;
//! use diffrec::params::ReconstructionParams;
//!
//! # let observation: DiffractionObservation = unimplemented!();
//! let params = ReconstructionParams::builder(0.75)
//!     .range_str("maxwell")
//!     .forward_model(true)
//!     .build()?;
//!
//! let rec = DiffractionCorrection::new(&observation, &params)?;
//! println!("{} points at {} km, tau[0] = {}", rec.n_used(), rec.res_km(), rec.tau()[0]);
//! # Ok::<(), diffrec::diffrec_errors::DiffrecError>(())
//! ```

use std::time::Instant;

use log::Level;
use num_complex::Complex64;

use crate::constants::Kilometer;
use crate::diffrec_errors::DiffrecError;
use crate::fresnel_kernel::PsiType;
use crate::fresnel_transform::{forward_block, FresnelTransform, TransformDirection};
use crate::observation::{AncillarySeries, DiffractionObservation};
use crate::params::ReconstructionParams;
use crate::range_selector::{select_range, ProcessingRange};
use crate::result_finalizer::{
    optical_depth, power_and_phase, threshold_optical_depth, trim, Provenance,
};
use crate::validation::normalize_observation;
use crate::window_functions::WindowType;
use crate::window_width::window_widths;

/// Forward model of a reconstruction, defined on a block narrower than the reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardModel {
    /// Offset of the block inside the reconstruction arrays
    pub offset: usize,
    /// Number of forward-modeled samples
    pub n_points: usize,
    pub t_hat_fwd: Vec<Complex64>,
    pub p_norm_fwd: Vec<f64>,
    /// Phase, same sign convention as the input phase (rad)
    pub phase_fwd_rad: Vec<f64>,
    pub tau_fwd: Vec<f64>,
    pub newton_capped_samples: usize,
}

/// Reconstructed ring profile.
///
/// Every per-sample array covers the processed block `[start, finish]` of the ascending radius
/// grid; forward-model arrays cover [`DiffractionCorrection::forward_range`] inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffractionCorrection {
    rho_km: Vec<Kilometer>,
    p_norm: Vec<f64>,
    phase_rad: Vec<f64>,
    b_rad: Vec<f64>,
    d_km: Vec<Kilometer>,
    phi_rad: Vec<f64>,
    f_sky_hz: Vec<f64>,
    rho_dot_kms: Vec<f64>,
    ancillary: AncillarySeries,

    mu: Vec<f64>,
    lambda_km: Vec<Kilometer>,
    f_km: Vec<Kilometer>,
    w_km: Vec<Kilometer>,
    t_hat: Vec<Complex64>,

    t: Vec<Complex64>,
    power: Vec<f64>,
    phase: Vec<f64>,
    tau: Vec<f64>,
    tau_threshold: Vec<f64>,
    forward: Option<ForwardModel>,

    dx_km: Kilometer,
    res_km: Kilometer,
    sigma: f64,
    norm_eq: f64,
    window_type: WindowType,
    psi_type: PsiType,
    range: ProcessingRange,
    newton_capped_samples: usize,
    provenance: Provenance,
}

impl DiffractionCorrection {
    /// Reconstruct `observation` with `params`.
    ///
    /// Arguments
    /// -----------------
    /// * `observation`: diffraction-limited profile, ascending or descending in radius
    /// * `params`: reconstruction parameters
    ///
    /// Return
    /// ----------
    /// * The reconstruction, or the first configuration, data or range error.
    ///
    /// See also
    /// -----------------
    /// * [`ReconstructionParams::builder`] – validated parameters.
    pub fn new(
        observation: &DiffractionObservation,
        params: &ReconstructionParams,
    ) -> Result<Self, DiffrecError> {
        let clock = Instant::now();
        let level = if params.verbose {
            Level::Info
        } else {
            Level::Debug
        };

        params.validate()?;
        log::log!(level, "Processing with {params}");

        let norm = normalize_observation(observation, params.res_km)?;
        log::log!(
            level,
            "Validated {} samples, dx = {} km{}",
            norm.len(),
            norm.dx_km,
            if norm.reversed { ", reversed to ascending radius" } else { "" }
        );

        let w_km = window_widths(
            &norm.f_km,
            &norm.f_sky_hz,
            &norm.rho_dot_kms,
            params.res_km,
            params.window_type,
            params.bfactor,
            params.sigma,
        )?;
        log::log!(
            level,
            "Window widths in [{:.3}, {:.3}] km",
            w_km.iter().copied().fold(f64::INFINITY, f64::min),
            w_km.iter().copied().fold(0.0, f64::max)
        );

        let range = select_range(&norm.rho_km, &w_km, params.range.bounds())?;
        log::log!(
            level,
            "Reconstructing {} points from index {} ([{}, {}] km)",
            range.n_used,
            range.start,
            range.rho_min,
            range.rho_max
        );

        let transform = FresnelTransform::new(
            &norm,
            &w_km,
            params.window_type,
            params.psi_type,
            params.normalize,
            params.use_fft,
        );

        let inverse = transform.run(
            &norm.t_hat,
            range.start,
            range.n_used,
            TransformDirection::Inverse,
        );
        log::log!(
            level,
            "Inversion done, {} window refreshes",
            inverse.window_refreshes
        );
        if inverse.newton_capped > 0 {
            log::warn!(
                "{} of {} samples stopped the stationary-phase search at the iteration cap",
                inverse.newton_capped,
                range.n_used
            );
        }

        let block = range.indices();

        let forward = if params.forward_model {
            let (fwd_start, fwd_n) = forward_block(&w_km, &range, norm.dx_km);
            if fwd_n == 0 {
                log::warn!(
                    "Forward model skipped: no sample of the {} reconstructed ones has a full window of reconstruction",
                    range.n_used
                );
            }
            let out = transform.run(&inverse.t_out, fwd_start, fwd_n, TransformDirection::Forward);
            if out.newton_capped > 0 {
                log::warn!(
                    "{} of {} forward samples stopped the stationary-phase search at the iteration cap",
                    out.newton_capped,
                    fwd_n
                );
            }

            let fwd_slice = fwd_start..fwd_start + fwd_n;
            let t_hat_fwd = trim(&out.t_out, fwd_slice.clone());
            let (p_norm_fwd, phase_fwd_rad) = power_and_phase(&t_hat_fwd);
            let tau_fwd = optical_depth(&p_norm_fwd, &norm.mu[fwd_slice]);
            log::log!(level, "Forward model done on {fwd_n} points");

            Some(ForwardModel {
                offset: fwd_start - range.start,
                n_points: fwd_n,
                t_hat_fwd,
                p_norm_fwd,
                phase_fwd_rad,
                tau_fwd,
                newton_capped_samples: out.newton_capped,
            })
        } else {
            None
        };

        let t = trim(&inverse.t_out, block.clone());
        let (power, phase) = power_and_phase(&t);
        let mu = trim(&norm.mu, block.clone());
        let tau = optical_depth(&power, &mu);
        let ancillary = norm.ancillary.map(|s| trim(s, block.clone()));
        let tau_threshold =
            threshold_optical_depth(&ancillary.raw_tau_threshold, &mu, norm.dx_km, params.res_km);

        let provenance = Provenance::new(
            params,
            [range.rho_min, range.rho_max],
            range.start,
            range.n_used,
            norm.reversed,
            &observation.history,
            &observation.rev_info,
        );

        let rec = DiffractionCorrection {
            rho_km: trim(&norm.rho_km, block.clone()),
            p_norm: trim(&norm.p_norm, block.clone()),
            phase_rad: norm.phase_rad[block.clone()].iter().map(|p| -p).collect(),
            b_rad: trim(&norm.b_rad, block.clone()),
            d_km: trim(&norm.d_km, block.clone()),
            phi_rad: trim(&norm.phi_rad, block.clone()),
            f_sky_hz: trim(&norm.f_sky_hz, block.clone()),
            rho_dot_kms: trim(&norm.rho_dot_kms, block.clone()),
            ancillary,
            mu,
            lambda_km: trim(&norm.lambda_km, block.clone()),
            f_km: trim(&norm.f_km, block.clone()),
            w_km: trim(&w_km, block.clone()),
            t_hat: trim(&norm.t_hat, block),
            t,
            power,
            phase,
            tau,
            tau_threshold,
            forward,
            dx_km: norm.dx_km,
            res_km: params.res_km,
            sigma: params.sigma,
            norm_eq: params.window_type.normeq(),
            window_type: params.window_type,
            psi_type: params.psi_type,
            range,
            newton_capped_samples: inverse.newton_capped,
            provenance,
        };

        log::log!(
            level,
            "Reconstruction finished in {:.3} s",
            clock.elapsed().as_secs_f64()
        );
        Ok(rec)
    }

    // --- Trimmed input arrays ---
    pub fn rho_km(&self) -> &[Kilometer] {
        &self.rho_km
    }
    pub fn p_norm(&self) -> &[f64] {
        &self.p_norm
    }
    /// Input phase, with the caller's sign convention (rad)
    pub fn phase_rad(&self) -> &[f64] {
        &self.phase_rad
    }
    pub fn b_rad(&self) -> &[f64] {
        &self.b_rad
    }
    pub fn d_km(&self) -> &[Kilometer] {
        &self.d_km
    }
    pub fn phi_rad(&self) -> &[f64] {
        &self.phi_rad
    }
    pub fn f_sky_hz(&self) -> &[f64] {
        &self.f_sky_hz
    }
    /// Radial velocity, positive (km/s)
    pub fn rho_dot_kms(&self) -> &[f64] {
        &self.rho_dot_kms
    }
    pub fn ancillary(&self) -> &AncillarySeries {
        &self.ancillary
    }

    // --- Derived arrays ---
    pub fn mu(&self) -> &[f64] {
        &self.mu
    }
    pub fn lambda_km(&self) -> &[Kilometer] {
        &self.lambda_km
    }
    /// Fresnel scale (km)
    pub fn f_km(&self) -> &[Kilometer] {
        &self.f_km
    }
    /// Window width (km)
    pub fn w_km(&self) -> &[Kilometer] {
        &self.w_km
    }
    /// Diffracted complex transmittance
    pub fn t_hat(&self) -> &[Complex64] {
        &self.t_hat
    }

    // --- Reconstruction ---
    /// Reconstructed complex transmittance
    pub fn t(&self) -> &[Complex64] {
        &self.t
    }
    pub fn power(&self) -> &[f64] {
        &self.power
    }
    pub fn phase(&self) -> &[f64] {
        &self.phase
    }
    /// Normal optical depth
    pub fn tau(&self) -> &[f64] {
        &self.tau
    }
    pub fn tau_threshold(&self) -> &[f64] {
        &self.tau_threshold
    }
    pub fn forward_model(&self) -> Option<&ForwardModel> {
        self.forward.as_ref()
    }
    /// `(offset, count)` of the forward-model block inside the reconstruction arrays.
    pub fn forward_range(&self) -> Option<(usize, usize)> {
        self.forward.as_ref().map(|f| (f.offset, f.n_points))
    }

    // --- Scalars ---
    pub fn dx_km(&self) -> Kilometer {
        self.dx_km
    }
    pub fn res_km(&self) -> Kilometer {
        self.res_km
    }
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
    pub fn norm_eq(&self) -> f64 {
        self.norm_eq
    }
    pub fn window_type(&self) -> WindowType {
        self.window_type
    }
    pub fn psi_type(&self) -> PsiType {
        self.psi_type
    }
    pub fn start(&self) -> usize {
        self.range.start
    }
    pub fn finish(&self) -> usize {
        self.range.finish
    }
    pub fn n_used(&self) -> usize {
        self.range.n_used
    }
    /// `[rho_min, rho_max]` allowed by window and request (km)
    pub fn range_km(&self) -> [Kilometer; 2] {
        [self.range.rho_min, self.range.rho_max]
    }
    /// Samples of the inversion whose stationary-phase search stopped at the iteration cap
    pub fn newton_capped_samples(&self) -> usize {
        self.newton_capped_samples
    }
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }
}
