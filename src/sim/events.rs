//! Event catalog: every transition a cell can undergo, with its per-cell rate.
//!
//! Order is fixed (state by state: birth, death, methylation, demethylation) so
//! weighted selection is reproducible for a given random stream.

use crate::domain::Event;
use crate::models::MethylationModel;

#[derive(Debug, Clone)]
pub struct EventCatalog {
    sites: usize,
    events: Vec<Event>,
}

impl EventCatalog {
    pub fn new(model: &MethylationModel) -> Self {
        let sites = model.sites();
        let mut events = Vec::with_capacity(4 * (sites + 1));
        for origin in 0..=sites {
            let r = model.state_rates(origin);
            events.push(Event::Birth {
                origin,
                rate: r.birth,
            });
            events.push(Event::Death {
                origin,
                rate: r.death,
            });
            if origin < sites {
                events.push(Event::Methylation {
                    origin,
                    rate: r.methylation,
                });
            }
            if origin > 0 {
                events.push(Event::Demethylation {
                    origin,
                    rate: r.demethylation,
                });
            }
        }
        Self { sites, events }
    }

    pub fn sites(&self) -> usize {
        self.sites
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Propensity of `event` given counts `n`: `rate × n[origin]`.
    pub fn weight(event: &Event, n: &[u64]) -> f64 {
        event.rate() * n[event.origin()] as f64
    }

    /// Sum of all event propensities for population `n`.
    pub fn total_rate(&self, n: &[u64]) -> f64 {
        self.events.iter().map(|e| Self::weight(e, n)).sum()
    }
}
