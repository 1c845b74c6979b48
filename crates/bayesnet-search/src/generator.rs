//! Random networks and ancestral sampling, for demos and benchmarks.

use bayesnet_data::{Attribute, Dataset, DatasetBuilder};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::{
    SearchError, estimator::ConditionalTable, network::Network, structure_file::StructureFile,
};

/// Largest conditional probability table, in cells, the generator builds.
pub const MAX_GENERATED_TABLE_CELLS: usize = 1 << 20;

/// Configuration for generating a random network.
///
/// Nodes are named `x0`, `x1`, ...; arcs always point from a lower to a
/// higher index, so index order is topological and the last node (the
/// default class of sampled datasets) is a sink. The arcs start as a random
/// spanning tree and are topped up with random extra arcs.
///
/// # Defaults
///
/// | Parameter     | Default |
/// |---------------|---------|
/// | `n_nodes`     | 10      |
/// | `n_arcs`      | 10      |
/// | `cardinality` | 2       |
/// | `max_parents` | 3       |
/// | `seed`        | 1       |
#[derive(Debug, Clone)]
pub struct NetworkGenerator {
    pub(crate) n_nodes: usize,
    pub(crate) n_arcs: usize,
    pub(crate) cardinality: usize,
    pub(crate) max_parents: usize,
    pub(crate) seed: u64,
}

impl NetworkGenerator {
    /// Create a generator with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_nodes: 10,
            n_arcs: 10,
            cardinality: 2,
            max_parents: 3,
            seed: 1,
        }
    }

    /// Set the number of nodes.
    #[must_use]
    pub fn with_n_nodes(mut self, n_nodes: usize) -> Self {
        self.n_nodes = n_nodes;
        self
    }

    /// Set the number of arcs.
    #[must_use]
    pub fn with_n_arcs(mut self, n_arcs: usize) -> Self {
        self.n_arcs = n_arcs;
        self
    }

    /// Set the number of values of every node.
    #[must_use]
    pub fn with_cardinality(mut self, cardinality: usize) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Set the maximum number of parents per node.
    #[must_use]
    pub fn with_max_parents(mut self, max_parents: usize) -> Self {
        self.max_parents = max_parents;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Return the number of arcs.
    #[must_use]
    pub fn n_arcs(&self) -> usize {
        self.n_arcs
    }

    /// Return the node cardinality.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Return the maximum number of parents per node.
    #[must_use]
    pub fn max_parents(&self) -> usize {
        self.max_parents
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a network with random tables.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::NoNodes`] | `n_nodes` is zero |
    /// | [`SearchError::InvalidCardinality`] | `cardinality` is below 2 |
    /// | [`SearchError::InvalidMaxParents`] | `max_parents` is zero |
    /// | [`SearchError::InvalidArcCount`] | `n_arcs` is below `n_nodes - 1` or above what `max_parents` allows |
    /// | [`SearchError::GeneratedTableTooLarge`] | a node's table could exceed [`MAX_GENERATED_TABLE_CELLS`] |
    #[instrument(skip(self), fields(n_nodes = self.n_nodes, n_arcs = self.n_arcs, seed = self.seed))]
    pub fn generate(&self) -> Result<GeneratedNetwork, SearchError> {
        self.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut network = Network::new(vec![self.cardinality; self.n_nodes]);

        // Spanning tree: every node after the first gets one earlier parent.
        for node in 1..self.n_nodes {
            let parent = rng.gen_range(0..node);
            network.add_parent(node, parent);
        }

        while network.n_arcs() < self.n_arcs {
            let tail = rng.gen_range(0..self.n_nodes - 1);
            let head = rng.gen_range(tail + 1..self.n_nodes);
            if network.parents(head).len() < self.max_parents && !network.is_arc(head, tail) {
                network.add_parent(head, tail);
            }
        }
        debug!(n_arcs = network.n_arcs(), "arcs generated");

        let tables = (0..self.n_nodes)
            .map(|node| -> Result<ConditionalTable, SearchError> {
                let n_cells = network
                    .parent_set(node)
                    .cardinality_of_parents()
                    .checked_mul(self.cardinality)
                    .filter(|&cells| cells <= MAX_GENERATED_TABLE_CELLS)
                    .ok_or_else(|| self.table_too_large())?;
                let parents = network.parents(node).to_vec();
                let draws: Vec<f64> = (0..n_cells).map(|_| rng.gen_range(0.0..1.0)).collect();
                Ok(ConditionalTable::from_counts(node, parents, self.cardinality, &draws, 0.0))
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        let attributes = (0..self.n_nodes)
            .map(|node| Attribute::with_cardinality(format!("x{node}"), self.cardinality))
            .collect::<Result<Vec<_>, _>>()?;

        info!(n_arcs = network.n_arcs(), "network generated");
        Ok(GeneratedNetwork {
            attributes,
            network,
            tables,
        })
    }

    fn validate(&self) -> Result<(), SearchError> {
        if self.n_nodes == 0 {
            return Err(SearchError::NoNodes);
        }
        if self.cardinality < 2 {
            return Err(SearchError::InvalidCardinality {
                cardinality: self.cardinality,
            });
        }
        if self.max_parents == 0 {
            return Err(SearchError::InvalidMaxParents { max_parents: 0 });
        }
        // Worst case: a node with every parent it may have.
        let widest = self.max_parents.min(self.n_nodes - 1);
        let mut cells = self.cardinality;
        for _ in 0..widest {
            cells = cells
                .checked_mul(self.cardinality)
                .filter(|&c| c <= MAX_GENERATED_TABLE_CELLS)
                .ok_or_else(|| self.table_too_large())?;
        }
        if cells > MAX_GENERATED_TABLE_CELLS {
            return Err(self.table_too_large());
        }

        let min = self.n_nodes - 1;
        let max: usize = (0..self.n_nodes).map(|i| i.min(self.max_parents)).sum();
        if self.n_arcs < min || self.n_arcs > max {
            return Err(SearchError::InvalidArcCount {
                n_nodes: self.n_nodes,
                n_arcs: self.n_arcs,
                min,
                max,
            });
        }
        Ok(())
    }

    fn table_too_large(&self) -> SearchError {
        SearchError::GeneratedTableTooLarge {
            cardinality: self.cardinality,
            max_parents: self.max_parents,
            limit: MAX_GENERATED_TABLE_CELLS,
        }
    }
}

impl Default for NetworkGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// A generated network: schema, structure, and tables.
#[derive(Debug, Clone)]
pub struct GeneratedNetwork {
    attributes: Vec<Attribute>,
    network: Network,
    tables: Vec<ConditionalTable>,
}

impl GeneratedNetwork {
    /// Return the node attributes.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Return the structure.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Return the tables, indexed by node.
    #[must_use]
    pub fn tables(&self) -> &[ConditionalTable] {
        &self.tables
    }

    /// Describe the structure by attribute name.
    #[must_use]
    pub fn structure(&self) -> StructureFile {
        StructureFile::from_network(&self.network, &self.attributes)
    }

    /// Draw `n_rows` records by ancestral sampling. The last node is the class.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Data`] if the dataset cannot be assembled.
    #[instrument(skip(self), fields(n_nodes = self.network.n_nodes()))]
    pub fn sample(&self, n_rows: usize, seed: u64) -> Result<Dataset, SearchError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let cardinalities = self.network.cardinalities();
        let mut builder = DatasetBuilder::new(self.attributes.clone())?;
        let mut row = vec![0; self.network.n_nodes()];

        for _ in 0..n_rows {
            // Index order is topological.
            for table in &self.tables {
                let distribution = table.row(table.configuration(&row, cardinalities));
                let u: f64 = rng.gen_range(0.0..1.0);
                let mut cumulative = 0.0;
                let mut value = distribution.len() - 1;
                for (k, &p) in distribution.iter().enumerate() {
                    cumulative += p;
                    if u < cumulative {
                        value = k;
                        break;
                    }
                }
                row[table.node()] = value;
            }
            builder.push_row(&row)?;
        }

        debug!(n_rows, "records sampled");
        Ok(builder.build())
    }
}
