use std::path::PathBuf;

use bayesnet_adtree::AdTreeError;
use bayesnet_data::DataError;

use crate::learner::SearchPhase;

/// Errors from structure search, parameter estimation, and structure files.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Returned when a node index does not name an attribute.
    #[error("node {node} out of range for {n_nodes} nodes")]
    NodeOutOfRange {
        /// The offending node index.
        node: usize,
        /// Number of nodes in the network.
        n_nodes: usize,
    },

    /// Returned when an arc would connect a node to itself.
    #[error("node {node} cannot be its own parent")]
    SelfLoop {
        /// The node.
        node: usize,
    },

    /// Returned when adding or reversing an arc would duplicate an arc or close a cycle.
    #[error("arc {tail} -> {head} cannot be applied without breaking acyclicity")]
    IllegalArc {
        /// Child end of the arc.
        head: usize,
        /// Parent end of the arc.
        tail: usize,
    },

    /// Returned when deleting or reversing an arc that does not exist.
    #[error("there is no arc {tail} -> {head}")]
    NotAnArc {
        /// Child end of the arc.
        head: usize,
        /// Parent end of the arc.
        tail: usize,
    },

    /// Returned when `max_parents` is zero.
    #[error("max_parents must be at least 1, got {max_parents}")]
    InvalidMaxParents {
        /// The invalid value.
        max_parents: usize,
    },

    /// Returned when a Dirichlet prior is negative or non-finite.
    #[error("alpha must be finite and non-negative, got {alpha}")]
    InvalidAlpha {
        /// The invalid value.
        alpha: f64,
    },

    /// Returned when the annealing start temperature is not positive.
    #[error("start temperature must be finite and positive, got {temperature}")]
    InvalidTemperature {
        /// The invalid value.
        temperature: f64,
    },

    /// Returned when the annealing cooling factor is outside (0, 1].
    #[error("cooling factor must be in (0.0, 1.0], got {delta}")]
    InvalidCooling {
        /// The invalid value.
        delta: f64,
    },

    /// Returned when the annealing run count is zero.
    #[error("runs must be at least 1, got {runs}")]
    InvalidRuns {
        /// The invalid value.
        runs: usize,
    },

    /// Returned when learning from a dataset with no rows.
    #[error("training dataset has zero rows")]
    EmptyDataset,

    /// Returned when a learning step runs out of order.
    #[error("structure search is in phase {found}, expected {expected}")]
    InvalidPhase {
        /// Phase the step requires.
        expected: SearchPhase,
        /// Phase the search was in.
        found: SearchPhase,
    },

    /// Returned when a structure file names an attribute the dataset does not have.
    #[error("structure file names unknown attribute \"{name}\"")]
    UnknownAttribute {
        /// The unresolvable name.
        name: String,
    },

    /// Returned when a dataset attribute has no entry in a structure file.
    #[error("structure file has no entry for attribute \"{name}\"")]
    MissingAttribute {
        /// The dataset attribute without an entry.
        name: String,
    },

    /// Returned when a structure file lists the same attribute twice.
    #[error("structure file lists attribute \"{name}\" more than once")]
    DuplicateEntry {
        /// The repeated name.
        name: String,
    },

    /// Returned when a structure file lists a parent twice for one node.
    #[error("structure file lists parent \"{parent}\" of \"{node}\" more than once")]
    DuplicateParent {
        /// The child attribute.
        node: String,
        /// The repeated parent.
        parent: String,
    },

    /// Returned when a structure file describes a cyclic graph.
    #[error("structure file arc \"{parent}\" -> \"{node}\" closes a cycle")]
    CyclicStructure {
        /// The child attribute.
        node: String,
        /// The parent attribute.
        parent: String,
    },

    /// Returned when structure serialization fails.
    #[error("failed to serialize structure")]
    SerializeStructure {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when structure deserialization fails.
    #[error("failed to deserialize structure from {path}")]
    DeserializeStructure {
        /// Path of the structure file.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing a structure file fails.
    #[error("failed to write structure to {path}")]
    WriteStructure {
        /// Path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading a structure file fails.
    #[error("failed to read structure from {path}")]
    ReadStructure {
        /// Path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a structure file has an incompatible format version.
    #[error("incompatible structure version in {path}: expected {expected}, found {found}")]
    IncompatibleStructureVersion {
        /// The format version this build expects.
        expected: u32,
        /// The format version found in the file.
        found: u32,
        /// Path of the structure file.
        path: PathBuf,
    },

    /// Returned when a prediction row has the wrong number of values.
    #[error("row has {got} values, expected {expected}")]
    RowLengthMismatch {
        /// Number of attributes in the model.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Returned when a prediction row holds a value outside an attribute's range.
    #[error("value {value} out of range for attribute {attribute} with {cardinality} values")]
    ValueOutOfRange {
        /// The attribute index.
        attribute: usize,
        /// The offending value.
        value: usize,
        /// Number of values the attribute declares.
        cardinality: usize,
    },

    /// Returned when the generator is asked for an impossible arc count.
    #[error("{n_nodes} nodes admit between {min} and {max} arcs, got {n_arcs}")]
    InvalidArcCount {
        /// Requested number of nodes.
        n_nodes: usize,
        /// Requested number of arcs.
        n_arcs: usize,
        /// Fewest arcs that keep the generated graph connected.
        min: usize,
        /// Most arcs an acyclic graph over the nodes can hold.
        max: usize,
    },

    /// Returned when the generator is asked for fewer than one node.
    #[error("generated networks need at least one node")]
    NoNodes,

    /// Returned when the generator is asked for attributes with fewer than two values.
    #[error("generated attributes need at least 2 values, got {cardinality}")]
    InvalidCardinality {
        /// The invalid value.
        cardinality: usize,
    },

    /// Returned when a generated probability table could exceed the cell limit.
    #[error(
        "generated tables for cardinality {cardinality} with up to {max_parents} parents exceed {limit} cells"
    )]
    GeneratedTableTooLarge {
        /// Requested node cardinality.
        cardinality: usize,
        /// Most parents any generated node may have.
        max_parents: usize,
        /// Largest table the generator builds.
        limit: usize,
    },

    /// Wraps a count query failure.
    #[error("count query failed: {0}")]
    Counts(#[from] AdTreeError),

    /// Wraps a dataset construction failure.
    #[error("dataset error: {0}")]
    Data(#[from] DataError),
}
