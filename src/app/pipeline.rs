//! Shared workflow logic behind the CLI subcommands.
//!
//! Keeping this in one place avoids mixing the engine calls with presentation:
//! params -> model -> solver / simulator -> result bundle
//!
//! `app` then only prints and exports.

use log::{info, warn};

use crate::cli::ModelArgs;
use crate::domain::{
    ExtinctionEstimate, ExtinctionSolution, LimitCurve, ModelParams, QuasistationaryDistribution, RateModelKind,
    Trajectory,
};
use crate::error::AppError;
use crate::models::MethylationModel;
use crate::report::{ExtinctionRow, compare_extinction};
use crate::sim::{MonteCarloOptions, SamplerOptions, StochasticSimulator, generate_timepoint_data, sample_extinction};
use crate::solve::{
    DeterministicPropagator, EigenSummary, ExtinctionOptions, LimitOptions, QuasistationaryOptions,
    calculate_extinction_rates, calculate_limit_extinction_rates, calculate_quasistationary,
    extinction_by_site_count, limit_extinction_by_methylation_scale,
};

/// Growth rates from the two quasistationary paths further apart than this are reported.
const EIGEN_DISAGREEMENT: f64 = 1e-6;

/// Built-in model used when no parameter file is given.
pub fn reference_params() -> ModelParams {
    ModelParams::uniform(4, 2.2, 3.0, 1.0, 0.2, 0.2, 1.0)
}

/// Validated model plus the record it was built from.
#[derive(Debug, Clone)]
pub struct ModelSetup {
    pub kind: RateModelKind,
    pub params: ModelParams,
    pub model: MethylationModel,
}

/// Resolve `--params` and the per-field overrides, then validate.
pub fn load_model(args: &ModelArgs) -> Result<ModelSetup, AppError> {
    let mut params = match &args.params {
        Some(path) => crate::io::read_params_json(path)?,
        None => reference_params(),
    };

    let overrides = [
        (&mut params.b_0, args.b_0),
        (&mut params.b_m, args.b_m),
        (&mut params.d_0, args.d_0),
        (&mut params.d_m, args.d_m),
        (&mut params.r_um, args.r_um),
        (&mut params.r_mu, args.r_mu),
        (&mut params.p, args.retention),
    ];
    for (field, value) in overrides {
        if let Some(v) = value {
            *field = v;
        }
    }
    if let Some(sites) = args.sites {
        params.sites = sites;
    }
    params.r_um_m = args.r_um_m.or(params.r_um_m);
    params.r_mu_u = args.r_mu_u.or(params.r_mu_u);
    params.degree = args.degree.or(params.degree);
    params.c = args.cutoff.or(params.c);

    let model = MethylationModel::from_params(args.model, &params)?;
    info!("model: {} with M = {}", args.model.display_name(), params.sites);
    Ok(ModelSetup {
        kind: args.model,
        params,
        model,
    })
}

pub fn run_simulation(
    setup: &ModelSetup,
    n_initial: &[u64],
    duration: f64,
    steps: usize,
    opts: &SamplerOptions,
) -> Result<Trajectory, AppError> {
    Ok(generate_timepoint_data(&setup.model, n_initial, duration, steps, opts)?)
}

/// All computed outputs of a single `methyl extinction` run.
#[derive(Debug, Clone)]
pub struct ExtinctionRun {
    pub solution: ExtinctionSolution,
    pub estimate: Option<ExtinctionEstimate>,
    pub rows: Vec<ExtinctionRow>,
    pub sweep: Vec<(usize, ExtinctionSolution)>,
}

pub fn run_extinction(
    setup: &ModelSetup,
    monte_carlo: Option<(usize, MonteCarloOptions)>,
    sweep: &[usize],
) -> Result<ExtinctionRun, AppError> {
    let opts = ExtinctionOptions::default();
    let solution = calculate_extinction_rates(&setup.model, &opts)?;

    let estimate = match monte_carlo {
        Some((attempts, mc)) => {
            let sim = StochasticSimulator::new(&setup.model)?;
            Some(sample_extinction(&sim, attempts, &mc)?)
        }
        None => None,
    };
    let rows = compare_extinction(&solution, estimate.as_ref())?;

    let sweep = if sweep.is_empty() {
        Vec::new()
    } else {
        extinction_by_site_count(setup.kind, &setup.params, sweep, &opts)?
    };

    Ok(ExtinctionRun {
        solution,
        estimate,
        rows,
        sweep,
    })
}

/// Continuum curve for the loaded rates plus any rescaled-methylation curves.
#[derive(Debug, Clone)]
pub struct LimitRun {
    pub curve: LimitCurve,
    pub by_scale: Vec<(f64, LimitCurve)>,
}

pub fn run_limit(setup: &ModelSetup, points: usize, scales: &[f64], opts: &LimitOptions) -> Result<LimitRun, AppError> {
    let curve = calculate_limit_extinction_rates(setup.model.rates(), points, opts)?;
    let by_scale = if scales.is_empty() {
        Vec::new()
    } else {
        limit_extinction_by_methylation_scale(setup.kind, &setup.params, scales, points, opts)?
    };
    Ok(LimitRun { curve, by_scale })
}

/// Power-iteration result plus the optional eigen cross-check.
#[derive(Debug, Clone)]
pub struct QuasistationaryRun {
    pub distribution: QuasistationaryDistribution,
    pub eigen: Option<EigenSummary>,
}

pub fn run_quasistationary(
    setup: &ModelSetup,
    opts: &QuasistationaryOptions,
    with_eigen: bool,
) -> Result<QuasistationaryRun, AppError> {
    let prop = DeterministicPropagator::new(&setup.model);
    let distribution = calculate_quasistationary(&prop, opts)?;

    let eigen = if with_eigen {
        match prop.dominant_eigen() {
            Ok(eig) => {
                let diff = (eig.growth_rate - distribution.growth_rate).abs();
                if diff > EIGEN_DISAGREEMENT {
                    warn!(
                        "eigen growth {:.8} disagrees with power iteration {:.8}; using power iteration",
                        eig.growth_rate, distribution.growth_rate
                    );
                }
                Some(eig)
            }
            Err(e) => {
                warn!("eigen cross-check unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    Ok(QuasistationaryRun { distribution, eigen })
}
