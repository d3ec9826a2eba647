use methyl_dynamics::domain::{ModelParams, RateModelKind};
use methyl_dynamics::models::MethylationModel;
use methyl_dynamics::sim::{SamplerOptions, SamplingMode, generate_timepoint_data};
use methyl_dynamics::solve::{
    DeterministicPropagator, ExtinctionOptions, QuasistationaryOptions, calculate_extinction_rates,
    calculate_quasistationary,
};

fn collaborative() -> ModelParams {
    let mut params = ModelParams::uniform(10, 2.0, 2.6, 1.2, 0.15, 0.1, 0.9);
    params.b_0 = 1.6;
    params.r_um_m = Some(0.8);
    params.r_mu_u = Some(0.6);
    params.degree = Some(2.0);
    params
}

#[test]
fn closed_states_behave_like_independent_branching_processes() {
    // No methylation flux and perfect retention: each state is its own
    // birth-death process.
    let (b, d_0, d_m, t) = (2.0, 3.0, 1.0, 0.8);
    let params = ModelParams::uniform(2, b, d_0, d_m, 0.0, 0.0, 1.0);
    let model = MethylationModel::from_params(RateModelKind::Linear, &params).unwrap();
    let prop = DeterministicPropagator::new(&model);
    let extinction = calculate_extinction_rates(&model, &ExtinctionOptions::default()).unwrap();

    for i in 0..=2 {
        let r = model.state_rates(i);
        let mut unit = vec![0.0; 3];
        unit[i] = 1.0;
        let out = prop.run_det(&unit, t).unwrap();
        let expected = ((r.birth - r.death) * t).exp();
        assert!((out[i] - expected).abs() < 1e-10, "state {i}: {} vs {expected}", out[i]);
        // State 1 is critical (b = d): its root is double, so a 1e-12
        // residual only pins it to about 1e-6.
        let tol = if r.birth == r.death { 1e-5 } else { 1e-10 };
        assert!((extinction.probabilities[i] - (r.death / r.birth).min(1.0)).abs() < tol);
    }

    let qsd = calculate_quasistationary(&prop, &QuasistationaryOptions::default()).unwrap();
    assert!((qsd.growth_rate - (b - d_m)).abs() < 1e-9);
    assert!((qsd.distribution[2] - 1.0).abs() < 1e-9);
}

#[test]
fn power_iteration_and_eigen_path_agree_for_collaborative_model() {
    let model = MethylationModel::from_params(RateModelKind::Collaborative, &collaborative()).unwrap();
    let prop = DeterministicPropagator::new(&model);
    let qsd = calculate_quasistationary(&prop, &QuasistationaryOptions::default()).unwrap();
    let eig = prop.dominant_eigen().unwrap();

    assert!(
        (qsd.growth_rate - eig.growth_rate).abs() < 1e-7,
        "{} vs {}",
        qsd.growth_rate,
        eig.growth_rate
    );
    for (a, b) in qsd.distribution.iter().zip(&eig.distribution) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn expected_counts_match_the_stochastic_mean() {
    // Average many stochastic datasets and compare with the deterministic one.
    let params = ModelParams::uniform(3, 1.0, 1.2, 0.6, 0.3, 0.2, 0.8);
    let model = MethylationModel::from_params(RateModelKind::Linear, &params).unwrap();
    let n0 = [10, 0, 0, 10];

    let det = generate_timepoint_data(
        &model,
        &n0,
        1.0,
        1,
        &SamplerOptions {
            mode: SamplingMode::Deterministic,
            ..SamplerOptions::default()
        },
    )
    .unwrap();

    let runs = 400;
    let mut mean = vec![0.0; 4];
    for seed in 0..runs {
        let opts = SamplerOptions {
            seed,
            ..SamplerOptions::default()
        };
        let traj = generate_timepoint_data(&model, &n0, 1.0, 1, &opts).unwrap();
        for (m, v) in mean.iter_mut().zip(&traj.populations[1]) {
            *m += v / runs as f64;
        }
    }

    let det_total: f64 = det.populations[1].iter().sum();
    let mc_total: f64 = mean.iter().sum();
    assert!(
        (det_total - mc_total).abs() < 0.1 * det_total,
        "deterministic {det_total} vs stochastic mean {mc_total}"
    );
}

#[test]
fn every_variant_conserves_mass_in_the_generator() {
    let mut params = collaborative();
    params.c = Some(0.35);
    for kind in [
        RateModelKind::Linear,
        RateModelKind::Threshold,
        RateModelKind::Collaborative,
        RateModelKind::SuperCollaborative,
    ] {
        let model = MethylationModel::from_params(kind, &params).unwrap();
        let g = DeterministicPropagator::new(&model).generator();
        for i in 0..g.nrows() {
            let s: f64 = g.row(i).iter().sum();
            assert!(s.abs() < 1e-9, "{kind:?} row {i}: {s}");
        }
    }
}
