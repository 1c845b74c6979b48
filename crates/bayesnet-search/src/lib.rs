//! Bayesian network structure learning over discrete data.
//!
//! Provides per-node [`ParentSet`]s and the [`Network`] they form, pure
//! arc-legality checks that keep the graph acyclic, decomposable local
//! scores, pluggable search strategies (K2, hill climbing, simulated
//! annealing, fixed structures), Markov-blanket correction around the
//! class, parameter estimation, and named structure files. Count queries go
//! through [`bayesnet_adtree::CountSource`], so an AD-tree or a plain row
//! scan can back any score.

mod error;
mod estimator;
mod generator;
mod learner;
mod legality;
mod markov;
mod model;
mod network;
mod parent_set;
mod score;
mod strategy;
mod structure_file;

pub use error::SearchError;
pub use estimator::{ConditionalTable, estimate_tables};
pub use generator::{GeneratedNetwork, MAX_GENERATED_TABLE_CELLS, NetworkGenerator};
pub use learner::{BayesNetConfig, SearchPhase, StructureSearch};
pub use legality::{can_add_arc, can_reverse_arc, is_arc, topological_order};
pub use markov::{MarkovCorrection, ancestors, in_markov_blanket, markov_blanket_correction};
pub use model::BayesNet;
pub use network::Network;
pub use parent_set::{MAX_PARENT_CARDINALITY, ParentSet};
pub use score::{LocalScore, ScoreMetric, ScoreType};
pub use strategy::{
    FixedStructure, HillClimber, K2, SearchContext, SearchMethod, SearchStrategy,
    SimulatedAnnealing,
};
pub use structure_file::{NodeEntry, StructureFile};
