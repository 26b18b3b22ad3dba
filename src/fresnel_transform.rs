//! # Fresnel transform sweep
//!
//! Evaluates the Fresnel integral (MTR86 Eq. 15) at every sample of a block, either to invert
//! the diffraction ([`TransformDirection::Inverse`]) or to forward-model it again from a
//! reconstruction ([`TransformDirection::Forward`]):
//!
//! ```text
//! T(ρ0)  = (1 + i)/(2F) · Σ w(ρ − ρ0) · T̂(ρ) · exp(−iψ) · dx        (inverse)
//! T̂(ρ0) = (1 − i)/(2F) · Σ w(ρ − ρ0) · T(ρ)  · exp(+iψ) · dx        (forward)
//! ```
//!
//! The sweep is sequential. Its state (`SweepState`) is threaded through a fold over the
//! block and carries
//!
//! * the window width the taper was last computed for, and the taper itself,
//! * the first data index of the next window when it slides by one sample,
//! * the stationary azimuth `φs` at every point of the window, seed of the next Newton search.
//!
//! The taper is recomputed only when the window width drifts by at least `2·dx`; the window
//! then restarts from a first-order estimate of `φs`. Otherwise it slides by one sample and the
//! previous `φs` is refined by Newton-Raphson, up to [`NEWTON_MAX_ITER`] iterations past the
//! first step (see [`FresnelTransform::newton_max_iter`]). Samples still above [`NEWTON_EPS`]
//! after the cap are kept as they are and counted in [`TransformOutput::newton_capped`].

use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::constants::{Kilometer, Radian, NEWTON_EPS, NEWTON_MAX_ITER, SQRT_2};
use crate::fresnel_kernel::{
    fresnel_psi, quartic_coefficients, quartic_psi, PointGeometry, PsiType,
};
use crate::range_selector::ProcessingRange;
use crate::validation::NormalizedObservation;
use crate::window_functions::WindowType;

/// Sign convention of the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformDirection {
    /// Diffraction-limited profile to reconstruction
    Inverse,
    /// Reconstruction back to a diffraction-limited profile
    Forward,
}

impl TransformDirection {
    /// Sign of the phase in the kernel `exp(±iψ)`.
    #[inline]
    pub fn kernel_sign(&self) -> f64 {
        match self {
            TransformDirection::Inverse => -1.0,
            TransformDirection::Forward => 1.0,
        }
    }

    /// Factor `(1 ± i)/(2F)` in front of the integral.
    #[inline]
    pub fn scale(&self, f_km: Kilometer) -> Complex64 {
        let c = match self {
            TransformDirection::Inverse => Complex64::new(1.0, 1.0),
            TransformDirection::Forward => Complex64::new(1.0, -1.0),
        };
        c / (2.0 * f_km)
    }
}

/// Result of one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    /// One value per input sample, zero outside the processed block
    pub t_out: Vec<Complex64>,
    pub start: usize,
    pub n_points: usize,
    /// Samples whose stationary-phase search stopped at the iteration cap
    pub newton_capped: usize,
    /// Number of times the taper was recomputed
    pub window_refreshes: usize,
}

/// Sequential state of the sweep.
#[derive(Debug, Clone)]
struct SweepState {
    width: Kilometer,
    taper: Vec<f64>,
    next_first: usize,
    phi_s: Vec<Radian>,
    values: Vec<Complex64>,
    newton_capped: usize,
    window_refreshes: usize,
}

/// How the windowed integral is summed.
enum Integrator {
    Direct,
    Fft(FftConvolver),
}

/// Circular convolution of a data segment with the kernel, through the FFT.
struct FftConvolver {
    planner: FftPlanner<f64>,
    plans: Option<(usize, Arc<dyn Fft<f64>>, Arc<dyn Fft<f64>>)>,
}

impl FftConvolver {
    fn new() -> Self {
        FftConvolver {
            planner: FftPlanner::new(),
            plans: None,
        }
    }

    fn plans(&mut self, n: usize) -> (Arc<dyn Fft<f64>>, Arc<dyn Fft<f64>>) {
        match &self.plans {
            Some((len, fwd, inv)) if *len == n => (Arc::clone(fwd), Arc::clone(inv)),
            _ => {
                let fwd = self.planner.plan_fft_forward(n);
                let inv = self.planner.plan_fft_inverse(n);
                self.plans = Some((n, Arc::clone(&fwd), Arc::clone(&inv)));
                (fwd, inv)
            }
        }
    }

    /// Midpoint of `ifftshift(ifft(fft(data) · fft(kernel)))`.
    fn center_value(&mut self, data: &[Complex64], kernel: &[Complex64]) -> Complex64 {
        let n = data.len();
        let (fwd, inv) = self.plans(n);

        let mut a = data.to_vec();
        let mut b = kernel.to_vec();
        fwd.process(&mut a);
        fwd.process(&mut b);
        a.iter_mut().zip(&b).for_each(|(x, y)| *x *= *y);
        inv.process(&mut a);

        // ifftshift moves index (i + n/2) mod n to i
        let mid = (n - 1) / 2;
        a[(mid + n / 2) % n] / n as f64
    }
}

impl Integrator {
    fn new(use_fft: bool) -> Self {
        if use_fft {
            Integrator::Fft(FftConvolver::new())
        } else {
            Integrator::Direct
        }
    }

    fn sum(&mut self, data: &[Complex64], kernel: &[Complex64]) -> Complex64 {
        match self {
            Integrator::Direct => data.iter().zip(kernel).map(|(t, k)| t * k).sum(),
            Integrator::Fft(conv) => conv.center_value(data, kernel),
        }
    }
}

/// Fresnel transform over a normalized observation.
///
/// See also
/// -----------------
/// * [`forward_block`] – block that a forward pass can cover.
pub struct FresnelTransform<'a> {
    obs: &'a NormalizedObservation,
    w_km: &'a [Kilometer],
    window_type: WindowType,
    psi_type: PsiType,
    normalize: bool,
    use_fft: bool,
    newton_max_iter: usize,
}

impl<'a> FresnelTransform<'a> {
    /// Arguments
    /// -----------------
    /// * `obs`: normalized observation (geometry of every sample)
    /// * `w_km`: window width at every sample (km)
    /// * `window_type`: tapering window
    /// * `psi_type`: approximation of the geometric phase
    /// * `normalize`: divide by the free-space integral of the kernel
    /// * `use_fft`: sum the integral by FFT convolution
    pub fn new(
        obs: &'a NormalizedObservation,
        w_km: &'a [Kilometer],
        window_type: WindowType,
        psi_type: PsiType,
        normalize: bool,
        use_fft: bool,
    ) -> Self {
        FresnelTransform {
            obs,
            w_km,
            window_type,
            psi_type,
            normalize,
            use_fft,
            newton_max_iter: NEWTON_MAX_ITER,
        }
    }

    /// Override the Newton-Raphson iteration cap (default [`NEWTON_MAX_ITER`]).
    pub fn newton_max_iter(mut self, max_iter: usize) -> Self {
        self.newton_max_iter = max_iter;
        self
    }

    /// Sweep `n_points` samples from `start`.
    ///
    /// Every window must fit inside the data, which [`crate::range_selector::select_range`]
    /// and [`forward_block`] guarantee.
    ///
    /// Arguments
    /// -----------------
    /// * `t_in`: complex transmittance to integrate, one value per sample
    /// * `start`: first sample to compute
    /// * `n_points`: number of samples to compute
    /// * `direction`: inverse or forward transform
    pub fn run(
        &self,
        t_in: &[Complex64],
        start: usize,
        n_points: usize,
        direction: TransformDirection,
    ) -> TransformOutput {
        let mut t_out = vec![Complex64::new(0.0, 0.0); t_in.len()];
        if n_points == 0 {
            return TransformOutput {
                t_out,
                start,
                n_points,
                newton_capped: 0,
                window_refreshes: 0,
            };
        }

        let mut integrator = Integrator::new(self.use_fft);
        let state = (start..start + n_points).fold(self.initial_state(start), |state, center| {
            self.advance(state, center, t_in, direction, &mut integrator)
        });

        t_out[start..start + n_points].copy_from_slice(&state.values);

        TransformOutput {
            t_out,
            start,
            n_points,
            newton_capped: state.newton_capped,
            window_refreshes: state.window_refreshes,
        }
    }

    /// State before the first sample: the window sits one sample early so that the first step
    /// slides it into place.
    fn initial_state(&self, start: usize) -> SweepState {
        let dx = self.obs.dx_km;
        let width = self.w_km[start];
        let taper = self.window_type.evaluate(width, dx);
        let half = (taper.len() - 1) / 2;
        let phi_s = vec![self.obs.phi_rad[start]; taper.len()];

        SweepState {
            width,
            taper,
            next_first: start - half,
            phi_s,
            values: Vec::new(),
            newton_capped: 0,
            window_refreshes: 0,
        }
    }

    fn advance(
        &self,
        mut state: SweepState,
        center: usize,
        t_in: &[Complex64],
        direction: TransformDirection,
        integrator: &mut Integrator,
    ) -> SweepState {
        let obs = self.obs;
        let dx = obs.dx_km;
        let w = self.w_km[center];
        let r0 = obs.rho_km[center];
        let f_km = obs.f_km[center];

        let refresh = (state.width - w).abs() >= 2.0 * dx;
        let first = if refresh {
            state.width = w;
            state.taper = self.window_type.evaluate(w, dx);
            state.window_refreshes += 1;
            center - (state.taper.len() - 1) / 2
        } else {
            state.next_first
        };
        state.next_first = first + 1;

        let nw = state.taper.len();
        let r = &obs.rho_km[first..first + nw];
        let x: Vec<f64> = r.iter().map(|ri| ri - r0).collect();

        let mut iterations = 0;
        let psi: Vec<f64> = if self.psi_type.needs_stationary_phase() {
            let phi0 = obs.phi_rad[center];
            let geom = PointGeometry::new(
                r0,
                phi0,
                obs.b_rad[center],
                obs.d_km[center],
                obs.lambda_km[center],
            );

            let mut max_step = if refresh {
                let (phi_s, max_dphi) = r.iter().fold(
                    (Vec::with_capacity(nw), 0.0_f64),
                    |(mut phi_s, m), ri| {
                        let (phi, dphi) = geom.perturbed_azimuth(phi0, *ri);
                        phi_s.push(phi);
                        (phi_s, m.max(dphi.abs()))
                    },
                );
                state.phi_s = phi_s;
                max_dphi
            } else {
                newton_sweep(&geom, r, &mut state.phi_s)
            };

            while max_step > NEWTON_EPS && iterations < self.newton_max_iter {
                max_step = newton_sweep(&geom, r, &mut state.phi_s);
                iterations += 1;
            }
            if max_step > NEWTON_EPS {
                state.newton_capped += 1;
            }

            let full: Vec<f64> = r
                .iter()
                .zip(&state.phi_s)
                .map(|(ri, phi)| geom.psi(*ri, *phi))
                .collect();

            match self.psi_type {
                PsiType::Mtr4 => match quartic_coefficients(&x, &full) {
                    Some(c) => x.iter().map(|xi| quartic_psi(&c, *xi)).collect(),
                    None => full,
                },
                _ => full,
            }
        } else {
            x.iter().map(|xi| fresnel_psi(*xi, f_km)).collect()
        };

        let sign = direction.kernel_sign();
        let kernel: Vec<Complex64> = state
            .taper
            .iter()
            .zip(&psi)
            .map(|(t, p)| Complex64::from_polar(*t, sign * p))
            .collect();

        let mut t = integrator.sum(&t_in[first..first + nw], &kernel) * dx * direction.scale(f_km);
        if self.normalize {
            let free_space: Complex64 = kernel.iter().sum::<Complex64>() * dx;
            t *= SQRT_2 * f_km / free_space.norm();
        }

        log::trace!(
            "pt {center} window {nw} psi iters {iterations} T = {:.6}{:+.6}i",
            t.re,
            t.im
        );

        state.values.push(t);
        state
    }
}

/// One Newton-Raphson update of every stationary azimuth of the window.
///
/// Return
/// ----------
/// * The largest update magnitude.
fn newton_sweep(geom: &PointGeometry, r: &[Kilometer], phi_s: &mut [Radian]) -> f64 {
    r.iter()
        .zip(phi_s.iter_mut())
        .map(|(ri, phi)| {
            let dphi = geom.newton_step(*ri, *phi);
            *phi += dphi;
            dphi.abs()
        })
        .fold(0.0, f64::max)
}

/// Block `(start, n_points)` that the forward model can cover inside a reconstruction.
///
/// The reconstruction is only defined on `range`, so half of the widest window in it is
/// dropped at each end. `n_points` is zero when nothing is left.
pub fn forward_block(
    w_km: &[Kilometer],
    range: &ProcessingRange,
    dx_km: Kilometer,
) -> (usize, usize) {
    let w_max = w_km[range.indices()].iter().copied().fold(0.0, f64::max);
    let nw_fwd = (w_max / (2.0 * dx_km)).ceil() as usize;
    let n_fwd = range.n_used.saturating_sub(2 * nw_fwd);
    (range.start + nw_fwd.min(range.n_used), n_fwd)
}

#[cfg(test)]
mod fresnel_transform_test {
    use super::*;
    use crate::observation::DiffractionObservation;
    use crate::validation::normalize_observation;
    use approx::assert_relative_eq;

    fn free_space(n: usize) -> NormalizedObservation {
        let rho: Vec<f64> = (0..n).map(|k| 87_000.0 + 0.25 * k as f64).collect();
        let obs = DiffractionObservation::new(
            rho,
            vec![1.0; n],
            vec![0.0; n],
            vec![0.5; n],
            vec![2.3e5; n],
            vec![1.2; n],
            vec![8.427e9; n],
            vec![10.0; n],
        );
        normalize_observation(&obs, 1.0).unwrap()
    }

    #[test]
    fn test_direction_factors() {
        let f = 2.0;
        assert_eq!(TransformDirection::Inverse.scale(f), Complex64::new(0.25, 0.25));
        assert_eq!(TransformDirection::Forward.scale(f), Complex64::new(0.25, -0.25));
        assert_eq!(TransformDirection::Inverse.kernel_sign(), -1.0);
    }

    #[test]
    fn test_free_space_has_unit_modulus() {
        let obs = free_space(201);
        let w = vec![10.0; obs.len()];
        for psi_type in PsiType::ALL {
            let tr = FresnelTransform::new(&obs, &w, WindowType::Kb25, psi_type, true, false);
            let out = tr.run(&obs.t_hat, 30, 100, TransformDirection::Inverse);
            assert_eq!(out.window_refreshes, 0);
            assert_eq!(out.newton_capped, 0, "{psi_type}");
            for t in &out.t_out[30..130] {
                assert_relative_eq!(t.norm(), 1.0, max_relative = 1e-12);
            }
            assert_eq!(out.t_out[29], Complex64::new(0.0, 0.0));
            assert_eq!(out.t_out[130], Complex64::new(0.0, 0.0));
        }
    }

    #[test]
    fn test_fft_matches_direct_sum() {
        let obs = free_space(201);
        let w = vec![10.0; obs.len()];
        let direct =
            FresnelTransform::new(&obs, &w, WindowType::Coss, PsiType::Fresnel, false, false)
                .run(&obs.t_hat, 30, 100, TransformDirection::Inverse);
        let fft = FresnelTransform::new(&obs, &w, WindowType::Coss, PsiType::Fresnel, false, true)
            .run(&obs.t_hat, 30, 100, TransformDirection::Inverse);
        for (a, b) in direct.t_out.iter().zip(&fft.t_out).skip(30).take(100) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-10);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_window_refreshes_on_width_drift() {
        let obs = free_space(401);
        // grows by 0.125 km per sample, 2·dx = 0.5 km
        let w: Vec<f64> = (0..obs.len())
            .map(|k| 8.0 + 0.125 * (k as f64 - 100.0).max(0.0))
            .collect();
        let out = FresnelTransform::new(&obs, &w, WindowType::Rect, PsiType::Full, true, false)
            .run(&obs.t_hat, 100, 50, TransformDirection::Inverse);
        // every 4th sample after the start
        assert_eq!(out.window_refreshes, 12);
        for t in &out.t_out[100..150] {
            assert_relative_eq!(t.norm(), 1.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_iteration_cap_is_counted() {
        let obs = free_space(301);
        let w = vec![20.0; obs.len()];
        let tr = FresnelTransform::new(&obs, &w, WindowType::Kb25, PsiType::Full, true, false);

        let converged = tr.run(&obs.t_hat, 100, 50, TransformDirection::Inverse);
        assert_eq!(converged.newton_capped, 0);

        // no refinement past the first step: the first window starts from the center azimuth,
        // one Newton step moves φs by ~1e-4 rad
        let capped = FresnelTransform::new(&obs, &w, WindowType::Kb25, PsiType::Full, true, false)
            .newton_max_iter(0)
            .run(&obs.t_hat, 100, 50, TransformDirection::Inverse);
        assert!(capped.newton_capped >= 1);
        assert!(capped.newton_capped <= 50);

        // capped samples are kept, not dropped
        for (a, b) in converged.t_out[100..150].iter().zip(&capped.t_out[100..150]) {
            assert!(b.norm().is_finite());
            assert_relative_eq!(a.norm(), b.norm(), max_relative = 1e-3);
        }
    }

    #[test]
    fn test_empty_block() {
        let obs = free_space(50);
        let w = vec![5.0; obs.len()];
        let out = FresnelTransform::new(&obs, &w, WindowType::Kb20, PsiType::Full, true, false)
            .run(&obs.t_hat, 20, 0, TransformDirection::Forward);
        assert_eq!(out.n_points, 0);
        assert!(out.t_out.iter().all(|t| *t == Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_forward_block() {
        let w = vec![9.6; 1000];
        let range = ProcessingRange {
            start: 40,
            finish: 959,
            n_used: 920,
            rho_min: 0.0,
            rho_max: 0.0,
        };
        // ceil(9.6 / 0.5) = 20 samples at each end
        assert_eq!(forward_block(&w, &range, 0.25), (60, 880));

        let narrow = ProcessingRange {
            n_used: 30,
            finish: 69,
            ..range
        };
        assert_eq!(forward_block(&w, &narrow, 0.25), (60, 0));

        let tiny = ProcessingRange {
            n_used: 5,
            finish: 44,
            ..range
        };
        assert_eq!(forward_block(&w, &tiny, 0.25), (45, 0));
    }
}
