//! Exact stochastic simulation (Gillespie) of the population CTMC.
//!
//! Simulates:
//! - State = counts per methylation level (`n[i]`, `i ∈ [0, M]`)
//! - Events = the catalog entries, each with propensity `rate × n[origin]`
//! - Time = exponential waiting times with parameter equal to the total propensity
//!
//! The run stops when the total propensity is zero (absorbing: in particular an
//! extinct population) or when the next event would land past the observation
//! window. The overshoot is discarded, not interpolated.

use rand::Rng;
use rand::distributions::Open01;
use rand_distr::{Binomial, Distribution};

use crate::domain::Event;
use crate::error::{ModelError, ModelResult};
use crate::models::MethylationModel;
use crate::sim::control::RunControl;
use crate::sim::events::EventCatalog;

/// Step guard used by callers that do not pick their own.
pub const DEFAULT_MAX_STEPS: u64 = 100_000;

/// Single-trajectory simulator. Immutable, so one instance can drive many
/// trajectories concurrently.
#[derive(Debug, Clone)]
pub struct StochasticSimulator {
    catalog: EventCatalog,
    /// `daughters[i]`: state law of one daughter of a state-`i` parent.
    daughters: Vec<Binomial>,
}

impl StochasticSimulator {
    pub fn new(model: &MethylationModel) -> ModelResult<Self> {
        let p = model.retention();
        let daughters = (0..=model.sites())
            .map(|i| {
                Binomial::new(i as u64, p)
                    .map_err(|e| ModelError::config(format!("daughter distribution for state {i}: {e}")))
            })
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(Self {
            catalog: EventCatalog::new(model),
            daughters,
        })
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn state_count(&self) -> usize {
        self.catalog.sites() + 1
    }

    /// Simulate from `n_initial` for `duration` time units and return the final counts.
    ///
    /// Fails with [`ModelError::StepBudgetExceeded`] when the loop is entered
    /// more than `max_steps` times.
    pub fn run<R: Rng + ?Sized>(
        &self,
        n_initial: &[u64],
        duration: f64,
        max_steps: u64,
        rng: &mut R,
    ) -> ModelResult<Vec<u64>> {
        self.run_with_control(n_initial, duration, max_steps, rng, &RunControl::none())
    }

    /// [`Self::run`] with an external cancel token / deadline.
    pub fn run_with_control<R: Rng + ?Sized>(
        &self,
        n_initial: &[u64],
        duration: f64,
        max_steps: u64,
        rng: &mut R,
        control: &RunControl,
    ) -> ModelResult<Vec<u64>> {
        let mut n = n_initial.to_vec();
        self.advance(&mut n, duration, max_steps, rng, control)?;
        Ok(n)
    }

    /// Evolve `n` in place. Returns the number of events applied.
    ///
    /// On error `n` holds the state reached so far.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        n: &mut [u64],
        duration: f64,
        max_steps: u64,
        rng: &mut R,
        control: &RunControl,
    ) -> ModelResult<u64> {
        if n.len() != self.state_count() {
            return Err(ModelError::DimensionMismatch {
                expected: self.state_count(),
                found: n.len(),
            });
        }
        if duration.is_nan() || duration < 0.0 {
            return Err(ModelError::config(format!("duration must be >= 0, got {duration}")));
        }

        let mut remaining = duration;
        let mut steps: u64 = 0;
        let mut applied: u64 = 0;

        loop {
            steps += 1;
            if steps > max_steps {
                return Err(ModelError::StepBudgetExceeded { max_steps });
            }
            if control.should_stop() {
                return Err(ModelError::Cancelled { steps: applied });
            }

            let total_rate = self.catalog.total_rate(n);
            if total_rate == 0.0 {
                break;
            }

            let u: f64 = rng.sample(Open01);
            remaining -= -u.ln() / total_rate;
            if remaining < 0.0 {
                break;
            }

            let Some(event) = self.select_event(n, total_rate, rng) else {
                break;
            };
            self.apply(event, n, rng);
            applied += 1;
        }

        Ok(applied)
    }

    /// Pick the event at which the running total `V - Σ weights` first drops below zero.
    fn select_event<R: Rng + ?Sized>(&self, n: &[u64], total_rate: f64, rng: &mut R) -> Option<Event> {
        let v: f64 = rng.sample(Open01);
        let mut running = v * total_rate;
        let mut last_live = None;
        for event in self.catalog.events() {
            let weight = EventCatalog::weight(event, n);
            if weight > 0.0 {
                last_live = Some(*event);
            }
            running -= weight;
            if running < 0.0 {
                return Some(*event);
            }
        }
        // Rounding left a sliver of `running`; it belongs to the last live event.
        last_live
    }

    fn apply<R: Rng + ?Sized>(&self, event: Event, n: &mut [u64], rng: &mut R) {
        match event {
            Event::Birth { origin, .. } => {
                n[origin] -= 1;
                for _ in 0..2 {
                    let daughter = self.daughters[origin].sample(rng) as usize;
                    n[daughter] += 1;
                }
            }
            Event::Death { origin, .. } => {
                n[origin] -= 1;
            }
            Event::Methylation { origin, .. } => {
                n[origin] -= 1;
                n[origin + 1] += 1;
            }
            Event::Demethylation { origin, .. } => {
                n[origin] -= 1;
                n[origin - 1] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelParams, RateModelKind};
    use crate::sim::control::CancelToken;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn simulator(params: ModelParams) -> StochasticSimulator {
        let model = MethylationModel::from_params(RateModelKind::Linear, &params).unwrap();
        StochasticSimulator::new(&model).unwrap()
    }

    #[test]
    fn zero_rates_leave_population_unchanged() {
        let sim = simulator(ModelParams::uniform(3, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0));
        let mut rng = StdRng::seed_from_u64(1);
        let n = vec![4, 0, 7, 1];
        let out = sim.run(&n, 10.0, DEFAULT_MAX_STEPS, &mut rng).unwrap();
        assert_eq!(out, n);
    }

    #[test]
    fn empty_population_returns_immediately() {
        let sim = simulator(ModelParams::uniform(3, 2.0, 1.0, 1.0, 0.5, 0.5, 0.5));
        let mut rng = StdRng::seed_from_u64(1);
        let out = sim.run(&[0, 0, 0, 0], 10.0, 1, &mut rng).unwrap();
        assert_eq!(out, vec![0, 0, 0, 0]);
    }

    #[test]
    fn step_budget_is_exceeded_only_strictly() {
        // Pure death: 5 deaths, then one more loop entry that finds zero propensity.
        let sim = simulator(ModelParams::uniform(1, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0));
        let mut rng = StdRng::seed_from_u64(3);
        let out = sim.run(&[5, 0], f64::INFINITY, 6, &mut rng).unwrap();
        assert_eq!(out, vec![0, 0]);

        let mut rng = StdRng::seed_from_u64(3);
        let err = sim.run(&[5, 0], f64::INFINITY, 5, &mut rng).unwrap_err();
        assert!(matches!(err, ModelError::StepBudgetExceeded { max_steps: 5 }));
    }

    #[test]
    fn methylation_drifts_to_fully_methylated() {
        let sim = simulator(ModelParams::uniform(4, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0));
        let mut rng = StdRng::seed_from_u64(11);
        let out = sim.run(&[3, 2, 0, 1, 0], f64::INFINITY, DEFAULT_MAX_STEPS, &mut rng).unwrap();
        assert_eq!(out, vec![0, 0, 0, 0, 6]);
    }

    #[test]
    fn births_follow_retention() {
        // p = 1: daughters keep every site.
        let sim = simulator(ModelParams::uniform(3, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0));
        let mut rng = StdRng::seed_from_u64(5);
        let out = sim.run(&[0, 0, 2, 0], 1.0, DEFAULT_MAX_STEPS, &mut rng).unwrap();
        assert_eq!(out[0] + out[1] + out[3], 0);
        assert!(out[2] >= 2);

        // p = 0: daughters lose every site. Unmethylated cells do not divide
        // (b_0 = 0), so one division leaves exactly two cells in state 0.
        let mut params = ModelParams::uniform(3, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        params.b_0 = 0.0;
        let sim = simulator(params);
        let mut rng = StdRng::seed_from_u64(5);
        let out = sim.run(&[0, 0, 0, 1], f64::INFINITY, DEFAULT_MAX_STEPS, &mut rng).unwrap();
        assert_eq!(out, vec![2, 0, 0, 0]);
    }

    #[test]
    fn each_event_changes_total_by_its_population_delta() {
        let sim = simulator(ModelParams::uniform(3, 2.0, 1.0, 0.5, 0.4, 0.3, 0.6));
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(sim.catalog().events().len(), 4 * 2 + 3 + 3);
        for &event in sim.catalog().events() {
            let mut n = vec![5; sim.state_count()];
            sim.apply(event, &mut n, &mut rng);
            let total: u64 = n.iter().sum();
            assert_eq!(total as i64 - 20, event.population_delta(), "{event:?} left {n:?}");
        }
    }

    #[test]
    fn same_seed_same_trajectory() {
        let sim = simulator(ModelParams::uniform(4, 2.2, 3.0, 1.0, 0.2, 0.2, 0.8));
        let n = vec![10, 10, 10, 10, 10];
        let a = sim.run(&n, 1.0, DEFAULT_MAX_STEPS, &mut StdRng::seed_from_u64(99)).unwrap();
        let b = sim.run(&n, 1.0, DEFAULT_MAX_STEPS, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn advance_mutates_in_place_and_counts_events() {
        let sim = simulator(ModelParams::uniform(1, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0));
        let mut n = vec![3, 4];
        let mut rng = StdRng::seed_from_u64(8);
        let applied = sim
            .advance(&mut n, f64::INFINITY, DEFAULT_MAX_STEPS, &mut rng, &RunControl::none())
            .unwrap();
        assert_eq!(applied, 7);
        assert_eq!(n, vec![0, 0]);
    }

    #[test]
    fn cancelled_token_aborts() {
        let sim = simulator(ModelParams::uniform(2, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0));
        let token = CancelToken::new();
        token.cancel();
        let mut rng = StdRng::seed_from_u64(2);
        let err = sim
            .run_with_control(&[1, 0, 0], 100.0, DEFAULT_MAX_STEPS, &mut rng, &RunControl::with_token(token))
            .unwrap_err();
        assert!(matches!(err, ModelError::Cancelled { steps: 0 }));
    }

    #[test]
    fn rejects_wrong_length_and_negative_duration() {
        let sim = simulator(ModelParams::uniform(2, 1.0, 1.0, 1.0, 0.1, 0.1, 1.0));
        let mut rng = StdRng::seed_from_u64(2);
        assert!(matches!(
            sim.run(&[1, 0], 1.0, 10, &mut rng),
            Err(ModelError::DimensionMismatch { expected: 3, found: 2 })
        ));
        assert!(matches!(
            sim.run(&[1, 0, 0], -1.0, 10, &mut rng),
            Err(ModelError::Configuration(_))
        ));
    }
}
