mod common;

use std::collections::BTreeMap;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use diffrec::diffraction_correction::DiffractionCorrection;
use diffrec::fresnel_kernel::PsiType;
use diffrec::params::ReconstructionParams;
use diffrec::window_functions::WindowType;

use common::{free_space, indexed_ancillary, reversed, smooth_ring, DX, N_SAMPLES, RHO_0};

#[test]
fn test_free_space_round_trip() {
    let obs = free_space(N_SAMPLES);
    let params = ReconstructionParams::with_resolution(1.0).unwrap();
    let rec = DiffractionCorrection::new(&obs, &params).unwrap();

    // kb25 window of ~19.5 km: ceil(w/2) = 10 km dropped at each end
    assert_eq!(rec.start(), 40);
    assert_eq!(rec.n_used(), 721);
    assert_eq!(rec.finish(), 760);
    assert_eq!(rec.rho_km().len(), rec.n_used());
    assert_eq!(rec.rho_km()[0], RHO_0 + 10.0);

    for (p, tau) in rec.power().iter().zip(rec.tau()) {
        assert_abs_diff_eq!(*p, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(*tau, 0.0, epsilon = 1e-3);
    }
    assert_eq!(rec.newton_capped_samples(), 0);
    assert!(rec.forward_model().is_none());
    assert_eq!(rec.forward_range(), None);
}

#[test]
fn test_every_array_is_trimmed() {
    let obs = free_space(N_SAMPLES).with_ancillary(indexed_ancillary(N_SAMPLES, 0.5));
    let params = ReconstructionParams::builder(1.0)
        .window_type(WindowType::Kb35)
        .build()
        .unwrap();
    let rec = DiffractionCorrection::new(&obs, &params).unwrap();
    let n = rec.n_used();

    for len in [
        rec.p_norm().len(),
        rec.phase_rad().len(),
        rec.b_rad().len(),
        rec.d_km().len(),
        rec.phi_rad().len(),
        rec.f_sky_hz().len(),
        rec.rho_dot_kms().len(),
        rec.mu().len(),
        rec.lambda_km().len(),
        rec.f_km().len(),
        rec.w_km().len(),
        rec.t_hat().len(),
        rec.t().len(),
        rec.phase().len(),
        rec.tau_threshold().len(),
        rec.ancillary().t_oet_spm.len(),
        rec.ancillary().phi_rl_rad.len(),
    ] {
        assert_eq!(len, n);
    }

    assert_eq!(rec.ancillary().t_oet_spm[0], rec.start() as f64);
    assert_eq!(rec.ancillary().t_ret_spm[n - 1], rec.finish() as f64 - 0.5);
    for (th, mu) in rec.tau_threshold().iter().zip(rec.mu()) {
        assert_relative_eq!(*th, 0.5 + mu * (1.0 / DX).ln(), max_relative = 1e-14);
    }
}

#[test]
fn test_explicit_range() {
    let obs = free_space(N_SAMPLES);
    let params = ReconstructionParams::builder(1.0)
        .range_values(&[87_150.0, 87_050.0])
        .build()
        .unwrap();
    let rec = DiffractionCorrection::new(&obs, &params).unwrap();

    assert_eq!(rec.rho_km()[0], 87_050.0);
    assert_eq!(rec.rho_km()[rec.n_used() - 1], 87_150.0);
    assert_eq!(rec.range_km(), [87_050.0, 87_150.0]);
    assert_eq!(rec.n_used(), 401);
}

#[test]
fn test_descending_input_gives_the_same_profile() {
    let asc = smooth_ring(N_SAMPLES);
    let desc = reversed(&asc);
    let params = ReconstructionParams::with_resolution(1.5).unwrap();

    let a = DiffractionCorrection::new(&asc, &params).unwrap();
    let d = DiffractionCorrection::new(&desc, &params).unwrap();

    assert_eq!(a.rho_km(), d.rho_km());
    assert_eq!(a.power(), d.power());
    assert_eq!(a.phase(), d.phase());
    assert!(d.rho_dot_kms().iter().all(|v| *v > 0.0));
    assert!(d.provenance().reversed_input);
    assert!(!a.provenance().reversed_input);
}

#[test]
fn test_input_phase_keeps_its_sign() {
    let obs = smooth_ring(N_SAMPLES);
    let params = ReconstructionParams::with_resolution(1.0).unwrap();
    let rec = DiffractionCorrection::new(&obs, &params).unwrap();

    let start = rec.start();
    assert_eq!(rec.phase_rad(), &obs.phase_rad[start..start + rec.n_used()]);
    assert_eq!(rec.p_norm(), &obs.p_norm[start..start + rec.n_used()]);
}

#[test]
fn test_smooth_ring_is_reconstructed_in_place() {
    // far from any sharp feature the reconstruction barely differs from the input
    let obs = smooth_ring(N_SAMPLES);
    let params = ReconstructionParams::with_resolution(1.0).unwrap();
    let rec = DiffractionCorrection::new(&obs, &params).unwrap();

    for (p, p_in) in rec.power().iter().zip(rec.p_norm()) {
        assert_relative_eq!(*p, *p_in, max_relative = 1e-2);
    }
}

#[test]
fn test_quartic_psi_follows_full_psi() {
    let obs = smooth_ring(N_SAMPLES);
    let full = ReconstructionParams::with_resolution(1.0).unwrap();
    let mtr4 = ReconstructionParams::builder(1.0)
        .psi_type(PsiType::Mtr4)
        .build()
        .unwrap();

    let a = DiffractionCorrection::new(&obs, &full).unwrap();
    let b = DiffractionCorrection::new(&obs, &mtr4).unwrap();
    for (ta, tb) in a.t().iter().zip(b.t()) {
        assert_abs_diff_eq!(ta.re, tb.re, epsilon = 1e-3);
        assert_abs_diff_eq!(ta.im, tb.im, epsilon = 1e-3);
    }

    // mtr2 and mtr3 evaluate the full psi
    let mtr2 = ReconstructionParams::builder(1.0)
        .psi_type_str("mtr2")
        .build()
        .unwrap();
    let c = DiffractionCorrection::new(&obs, &mtr2).unwrap();
    assert_eq!(a.t(), c.t());
}

#[test]
fn test_scalars_and_provenance() {
    let obs = free_space(N_SAMPLES)
        .with_history(BTreeMap::from([("stage".to_string(), "normdiff".to_string())]))
        .with_rev_info(BTreeMap::from([("rev".to_string(), "007".to_string())]));
    let params = ReconstructionParams::builder(0.75)
        .window_type_str("coss")
        .sigma(1e-13)
        .verbose(true)
        .build()
        .unwrap();
    let _ = env_logger::builder().is_test(true).try_init();
    let rec = DiffractionCorrection::new(&obs, &params).unwrap();

    assert_eq!(rec.dx_km(), DX);
    assert_eq!(rec.res_km(), 0.75);
    assert_eq!(rec.sigma(), 1e-13);
    assert_eq!(rec.norm_eq(), 1.5);
    assert_eq!(rec.window_type(), WindowType::Coss);
    assert_eq!(rec.psi_type(), PsiType::Full);

    let prov = rec.provenance();
    assert_eq!(prov.crate_name, "diffrec");
    assert_eq!(prov.params, params);
    assert_eq!(prov.start, rec.start());
    assert_eq!(prov.n_used, rec.n_used());
    assert_eq!(prov.range_used_km, rec.range_km());
    assert_eq!(prov.input_history["stage"], "normdiff");
    assert_eq!(prov.input_rev_info["rev"], "007");

    let json = serde_json::to_string(prov).unwrap();
    assert!(json.contains("\"window_type\":\"coss\""));
    let back: diffrec::result_finalizer::Provenance = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, prov);
}
