//! Conditional probability tables from smoothed counts.

use bayesnet_adtree::CountSource;
use tracing::{debug, instrument};

use crate::{SearchError, network::Network};

/// `P(node | parents)` for one node.
///
/// Rows are parent configurations (first parent most significant), columns
/// are node values.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConditionalTable {
    node: usize,
    parents: Vec<usize>,
    n_values: usize,
    probabilities: Vec<f64>,
}

impl ConditionalTable {
    /// Build a table from raw `counts` laid out as `[configuration * n_values + value]`,
    /// smoothing each cell with `alpha`.
    ///
    /// A configuration with no data and `alpha == 0` yields a uniform row.
    #[must_use]
    pub fn from_counts(node: usize, parents: Vec<usize>, n_values: usize, counts: &[f64], alpha: f64) -> Self {
        let mut probabilities = Vec::with_capacity(counts.len());
        for row in counts.chunks_exact(n_values) {
            let total: f64 = row.iter().sum::<f64>() + alpha * n_values as f64;
            if total > 0.0 {
                probabilities.extend(row.iter().map(|&n| (n + alpha) / total));
            } else {
                probabilities.extend(std::iter::repeat_n(1.0 / n_values as f64, n_values));
            }
        }
        Self {
            node,
            parents,
            n_values,
            probabilities,
        }
    }

    /// Return the node this table belongs to.
    #[must_use]
    pub fn node(&self) -> usize {
        self.node
    }

    /// Return the parents the rows are indexed by.
    #[must_use]
    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    /// Return the number of node values (columns).
    #[must_use]
    pub fn n_values(&self) -> usize {
        self.n_values
    }

    /// Return the number of parent configurations (rows).
    #[must_use]
    pub fn n_configurations(&self) -> usize {
        self.probabilities.len() / self.n_values
    }

    /// Return the distribution over node values for `configuration`.
    #[must_use]
    pub fn row(&self, configuration: usize) -> &[f64] {
        let start = configuration * self.n_values;
        &self.probabilities[start..start + self.n_values]
    }

    /// Return `P(node = value | parents = configuration)`.
    #[must_use]
    pub fn probability(&self, configuration: usize, value: usize) -> f64 {
        self.probabilities[configuration * self.n_values + value]
    }

    /// Return the row index of the parent values found in `row`.
    ///
    /// `row` is indexed by node; `cardinalities` gives each node's size.
    #[must_use]
    pub fn configuration(&self, row: &[usize], cardinalities: &[usize]) -> usize {
        self.parents
            .iter()
            .fold(0, |acc, &p| acc * cardinalities[p] + row[p])
    }
}

/// Estimate every node's table with Dirichlet smoothing:
/// `P(x = k | pa = j) = (N_jk + alpha) / (N_j + r * alpha)`.
///
/// # Errors
///
/// Propagates count query failures as [`SearchError::Counts`].
#[instrument(skip_all, fields(n_nodes = network.n_nodes(), alpha = alpha))]
pub fn estimate_tables(
    network: &Network,
    counts: &dyn CountSource,
    alpha: f64,
) -> Result<Vec<ConditionalTable>, SearchError> {
    let mut tables = Vec::with_capacity(network.n_nodes());
    for node in 0..network.n_nodes() {
        let parents = network.parents(node).to_vec();
        let mut query = parents.clone();
        query.push(node);
        let table_counts = counts.counts(&query)?;
        tables.push(ConditionalTable::from_counts(
            node,
            parents,
            network.cardinality(node),
            &table_counts,
            alpha,
        ));
    }
    debug!(n_tables = tables.len(), "tables estimated");
    Ok(tables)
}
