//! Trajectory datasets on a uniform time grid.
//!
//! Row `0` is the initial population; every following row is obtained from the
//! previous one by a single step of length `duration / timestep_count`, either
//! one stochastic run or one deterministic propagation.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::Trajectory;
use crate::error::{ModelError, ModelResult};
use crate::models::MethylationModel;
use crate::sim::control::RunControl;
use crate::sim::gillespie::{DEFAULT_MAX_STEPS, StochasticSimulator};
use crate::solve::{DeterministicPropagator, QuasistationaryOptions, calculate_quasistationary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMode {
    #[default]
    Stochastic,
    Deterministic,
}

/// Settings for [`generate_timepoint_data`].
#[derive(Debug, Clone)]
pub struct SamplerOptions {
    pub mode: SamplingMode,
    /// Divide row `k` by `exp(growth · t_k)` with the quasistationary growth rate.
    pub normalized: bool,
    /// Step guard of each stochastic step.
    pub max_steps: u64,
    pub seed: u64,
    pub control: RunControl,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Stochastic,
            normalized: false,
            max_steps: DEFAULT_MAX_STEPS,
            seed: 42,
            control: RunControl::none(),
        }
    }
}

pub fn generate_timepoint_data(
    model: &MethylationModel,
    n_initial: &[u64],
    duration: f64,
    timestep_count: usize,
    opts: &SamplerOptions,
) -> ModelResult<Trajectory> {
    model.check_len(n_initial.len())?;
    if timestep_count == 0 {
        return Err(ModelError::config("timestep_count must be > 0"));
    }
    if !(duration.is_finite() && duration >= 0.0) {
        return Err(ModelError::config(format!("duration must be finite and >= 0, got {duration}")));
    }

    let dt = duration / timestep_count as f64;
    let timepoints: Vec<f64> = (0..=timestep_count).map(|k| k as f64 * dt).collect();
    let mut populations: Vec<Vec<f64>> = Vec::with_capacity(timestep_count + 1);
    populations.push(n_initial.iter().map(|&c| c as f64).collect());

    let propagator = DeterministicPropagator::new(model);
    match opts.mode {
        SamplingMode::Stochastic => {
            let sim = StochasticSimulator::new(model)?;
            let mut rng = StdRng::seed_from_u64(opts.seed);
            let mut n = n_initial.to_vec();
            for _ in 0..timestep_count {
                sim.advance(&mut n, dt, opts.max_steps, &mut rng, &opts.control)?;
                populations.push(n.iter().map(|&c| c as f64).collect());
            }
        }
        SamplingMode::Deterministic => {
            let step = propagator.operator(dt);
            for k in 0..timestep_count {
                let next = DeterministicPropagator::apply(&step, &populations[k]);
                if next.iter().any(|v| !v.is_finite()) {
                    return Err(ModelError::domain(format!("non-finite counts at t = {}", timepoints[k + 1])));
                }
                populations.push(next);
            }
        }
    }

    if opts.normalized {
        let growth = calculate_quasistationary(&propagator, &QuasistationaryOptions::default())?.growth_rate;
        debug!("normalizing trajectory by growth rate {growth:.6e}");
        for (row, &t) in populations.iter_mut().zip(&timepoints) {
            let scale = (-growth * t).exp();
            row.iter_mut().for_each(|v| *v *= scale);
        }
    }

    Ok(Trajectory {
        timepoints,
        populations,
    })
}
