use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use super::{SearchContext, SearchStrategy};
use crate::{SearchError, network::Network};

/// Randomized add/delete search with a geometric cooling schedule.
///
/// Each run draws a random ordered node pair. An existing arc is tentatively
/// deleted, a missing one tentatively added when legal; the edit is kept
/// when `temperature * ln(u) < delta_score` for uniform `u`, so improvements
/// are always accepted and regressions less often as the temperature falls.
/// The best network seen is returned.
///
/// # Defaults
///
/// | Parameter           | Default |
/// |---------------------|---------|
/// | `start_temperature` | 10.0    |
/// | `delta`             | 0.999   |
/// | `runs`              | 10000   |
/// | `seed`              | 1       |
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    pub(crate) start_temperature: f64,
    pub(crate) delta: f64,
    pub(crate) runs: usize,
    pub(crate) seed: u64,
}

impl SimulatedAnnealing {
    /// Create an annealing search with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_temperature: 10.0,
            delta: 0.999,
            runs: 10_000,
            seed: 1,
        }
    }

    /// Set the starting temperature.
    #[must_use]
    pub fn with_start_temperature(mut self, start_temperature: f64) -> Self {
        self.start_temperature = start_temperature;
        self
    }

    /// Set the factor the temperature is multiplied by after each run.
    #[must_use]
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the number of runs.
    #[must_use]
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the starting temperature.
    #[must_use]
    pub fn start_temperature(&self) -> f64 {
        self.start_temperature
    }

    /// Return the cooling factor.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Return the number of runs.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub(crate) fn validate(&self) -> Result<(), SearchError> {
        if !self.start_temperature.is_finite() || self.start_temperature <= 0.0 {
            return Err(SearchError::InvalidTemperature {
                temperature: self.start_temperature,
            });
        }
        if !(self.delta > 0.0 && self.delta <= 1.0) {
            return Err(SearchError::InvalidCooling { delta: self.delta });
        }
        if self.runs == 0 {
            return Err(SearchError::InvalidRuns { runs: 0 });
        }
        Ok(())
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchStrategy for SimulatedAnnealing {
    fn name(&self) -> &'static str {
        "simulated-annealing"
    }

    #[instrument(skip_all, fields(runs = self.runs, seed = self.seed))]
    fn search(&self, network: &mut Network, ctx: &SearchContext<'_>) -> Result<(), SearchError> {
        let n_nodes = network.n_nodes();
        if n_nodes < 2 {
            return Ok(());
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut node_scores = (0..n_nodes)
            .map(|node| ctx.score.node_score(node, network.parents(node)))
            .collect::<Result<Vec<_>, _>>()?;
        let mut current: f64 = node_scores.iter().sum();
        let mut best_score = current;
        let mut best = network.clone();
        let mut temperature = self.start_temperature;
        let mut accepted = 0usize;

        for _ in 0..self.runs {
            loop {
                let tail = rng.gen_range(0..n_nodes);
                let mut head = rng.gen_range(0..n_nodes);
                while head == tail {
                    head = rng.gen_range(0..n_nodes);
                }

                let (old, new) = if network.is_arc(head, tail) {
                    network.delete_arc(head, tail)?;
                    let new = ctx.score.node_score(head, network.parents(head))?;
                    if accept(&mut rng, temperature, new - node_scores[head]) {
                        (node_scores[head], new)
                    } else {
                        network.add_parent(head, tail);
                        break;
                    }
                } else if network.can_add_arc(head, tail) {
                    network.add_parent(head, tail);
                    let new = ctx.score.node_score(head, network.parents(head))?;
                    if accept(&mut rng, temperature, new - node_scores[head]) {
                        (node_scores[head], new)
                    } else {
                        network.delete_last_parent(head);
                        break;
                    }
                } else {
                    // Illegal addition: draw another pair.
                    continue;
                };

                node_scores[head] = new;
                current += new - old;
                accepted += 1;
                break;
            }

            if current > best_score {
                best_score = current;
                best.copy_parent_sets_from(network);
                debug!(score = best_score, "new best network");
            }
            temperature *= self.delta;
        }

        network.copy_parent_sets_from(&best);
        info!(accepted, score = best_score, n_arcs = network.n_arcs(), "annealing finished");
        Ok(())
    }
}

fn accept(rng: &mut ChaCha8Rng, temperature: f64, delta_score: f64) -> bool {
    let u = f64::from(rng.gen_range(0..10_000u32)) / 10_000.0;
    temperature * (u + 1e-100).ln() < delta_score
}
