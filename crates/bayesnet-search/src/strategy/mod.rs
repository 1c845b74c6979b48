//! Pluggable structure search strategies.
//!
//! Every strategy edits a [`Network`] in place, guided by a [`LocalScore`],
//! and must leave it acyclic. Strategies are selected with [`SearchMethod`],
//! which is resolved into a boxed [`SearchStrategy`] once, before any search
//! state exists; configuration errors surface there.

mod annealing;
mod fixed;
mod hill_climber;
mod k2;

use std::path::PathBuf;

use bayesnet_data::Dataset;

use crate::{SearchError, network::Network, score::LocalScore, structure_file::StructureFile};

pub use annealing::SimulatedAnnealing;
pub use fixed::FixedStructure;
pub use hill_climber::HillClimber;
pub use k2::K2;

/// What a strategy may consult while searching.
pub struct SearchContext<'a> {
    /// The training data.
    pub data: &'a Dataset,
    /// The metric guiding the search.
    pub score: &'a dyn LocalScore,
    /// Whether the network was seeded with the class as every node's parent.
    pub init_as_naive_bayes: bool,
}

/// A structure search policy.
pub trait SearchStrategy: std::fmt::Debug {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Improve `network` in place.
    ///
    /// # Errors
    ///
    /// Strategy failures (typically count queries) are returned unmodified.
    fn search(&self, network: &mut Network, ctx: &SearchContext<'_>) -> Result<(), SearchError>;
}

/// Selection of a search strategy and its settings.
#[derive(Debug, Clone)]
pub enum SearchMethod {
    /// Ordering-based greedy search.
    K2(K2),
    /// Greedy add/delete/reverse hill climbing.
    HillClimber(HillClimber),
    /// Randomized add/delete search with a cooling schedule.
    SimulatedAnnealing(SimulatedAnnealing),
    /// Structure read from a structure file.
    FromFile(PathBuf),
    /// Structure given in memory.
    Fixed(StructureFile),
}

impl SearchMethod {
    /// Validate the settings and build the strategy for `data`.
    ///
    /// # Errors
    ///
    /// Returns configuration errors (invalid parameters, unreadable or
    /// unresolvable structure files).
    pub fn resolve(&self, data: &Dataset) -> Result<Box<dyn SearchStrategy>, SearchError> {
        Ok(match self {
            SearchMethod::K2(k2) => {
                k2.validate()?;
                Box::new(k2.clone())
            }
            SearchMethod::HillClimber(hc) => {
                hc.validate()?;
                Box::new(hc.clone())
            }
            SearchMethod::SimulatedAnnealing(sa) => {
                sa.validate()?;
                Box::new(sa.clone())
            }
            SearchMethod::FromFile(path) => {
                let file = StructureFile::load(path)?;
                Box::new(FixedStructure::resolve(&file, data)?)
            }
            SearchMethod::Fixed(file) => Box::new(FixedStructure::resolve(file, data)?),
        })
    }
}

impl Default for SearchMethod {
    fn default() -> Self {
        SearchMethod::K2(K2::new())
    }
}
