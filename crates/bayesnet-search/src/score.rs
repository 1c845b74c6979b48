//! Decomposable local score metrics.

use bayesnet_adtree::CountSource;
use statrs::function::gamma::ln_gamma;

use crate::{SearchError, network::Network};

/// Quality measure for a node given its parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScoreType {
    /// Bayesian Dirichlet score with a uniform prior count `alpha` per cell.
    Bayes,
    /// Bayesian Dirichlet equivalent uniform score (equivalent sample size 1).
    BDeu,
    /// Minimum description length: log-likelihood minus ½·k·ln(n).
    Mdl,
    /// Akaike information criterion: log-likelihood minus k.
    Aic,
    /// Plain log-likelihood.
    Entropy,
}

impl std::fmt::Display for ScoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScoreType::Bayes => "bayes",
            ScoreType::BDeu => "bdeu",
            ScoreType::Mdl => "mdl",
            ScoreType::Aic => "aic",
            ScoreType::Entropy => "entropy",
        };
        f.write_str(name)
    }
}

/// A decomposable network score: the score of a network is the sum of the
/// local scores of its nodes.
///
/// Search strategies only ever call this trait, so any metric can drive
/// them.
pub trait LocalScore {
    /// Score `node` with the given parents.
    ///
    /// # Errors
    ///
    /// Implementations return [`SearchError`] when the counts they need
    /// cannot be produced.
    fn node_score(&self, node: usize, parents: &[usize]) -> Result<f64, SearchError>;

    /// Score `node` with `parents` plus `candidate`.
    ///
    /// # Errors
    ///
    /// Same as [`LocalScore::node_score`].
    fn score_with_extra_parent(
        &self,
        node: usize,
        parents: &[usize],
        candidate: usize,
    ) -> Result<f64, SearchError> {
        let mut extended = Vec::with_capacity(parents.len() + 1);
        extended.extend_from_slice(parents);
        extended.push(candidate);
        self.node_score(node, &extended)
    }

    /// Score `node` with `parents` minus `removed`.
    ///
    /// # Errors
    ///
    /// Same as [`LocalScore::node_score`].
    fn score_with_missing_parent(
        &self,
        node: usize,
        parents: &[usize],
        removed: usize,
    ) -> Result<f64, SearchError> {
        let reduced: Vec<usize> = parents.iter().copied().filter(|&p| p != removed).collect();
        self.node_score(node, &reduced)
    }

    /// Sum of the local scores of every node.
    ///
    /// # Errors
    ///
    /// Same as [`LocalScore::node_score`].
    fn network_score(&self, network: &Network) -> Result<f64, SearchError> {
        (0..network.n_nodes())
            .map(|node| self.node_score(node, network.parents(node)))
            .sum()
    }
}

/// The built-in [`LocalScore`] over a [`CountSource`].
///
/// The count table for a node is laid out parent-configuration-major with
/// the first parent most significant, node value least significant.
pub struct ScoreMetric<'a> {
    counts: &'a dyn CountSource,
    n_rows: usize,
    score_type: ScoreType,
    alpha: f64,
}

impl std::fmt::Debug for ScoreMetric<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreMetric")
            .field("n_rows", &self.n_rows)
            .field("score_type", &self.score_type)
            .field("alpha", &self.alpha)
            .finish_non_exhaustive()
    }
}

impl<'a> ScoreMetric<'a> {
    /// Create a metric. `n_rows` is the number of records (used by MDL);
    /// `alpha` is the Dirichlet prior count used by [`ScoreType::Bayes`].
    #[must_use]
    pub fn new(counts: &'a dyn CountSource, n_rows: usize, score_type: ScoreType, alpha: f64) -> Self {
        Self {
            counts,
            n_rows,
            score_type,
            alpha,
        }
    }

    /// Return the score type.
    #[must_use]
    pub fn score_type(&self) -> ScoreType {
        self.score_type
    }

    /// Score a count table of `n_configurations` rows of `n_values` cells.
    #[must_use]
    pub fn score_of_counts(&self, counts: &[f64], n_configurations: usize, n_values: usize) -> f64 {
        let q = n_configurations as f64;
        let r = n_values as f64;
        let mut score = 0.0;

        for row in counts.chunks_exact(n_values) {
            match self.score_type {
                ScoreType::Bayes => {
                    let mut sum = 0.0;
                    for &n in row {
                        if self.alpha + n != 0.0 {
                            score += ln_gamma(self.alpha + n);
                            sum += self.alpha + n;
                        }
                    }
                    if sum != 0.0 {
                        score -= ln_gamma(sum);
                    }
                    if self.alpha != 0.0 {
                        score -= r * ln_gamma(self.alpha);
                        score += ln_gamma(r * self.alpha);
                    }
                }
                ScoreType::BDeu => {
                    let cell_prior = 1.0 / (r * q);
                    let mut sum = 0.0;
                    for &n in row {
                        score += ln_gamma(cell_prior + n);
                        sum += n;
                    }
                    score -= ln_gamma(1.0 / q + sum);
                    score -= r * ln_gamma(cell_prior);
                    score += ln_gamma(1.0 / q);
                }
                ScoreType::Mdl | ScoreType::Aic | ScoreType::Entropy => {
                    let sum: f64 = row.iter().sum();
                    for &n in row {
                        if n > 0.0 {
                            score += n * (n / sum).ln();
                        }
                    }
                }
            }
        }

        match self.score_type {
            ScoreType::Mdl => score -= 0.5 * q * (r - 1.0) * (self.n_rows as f64).ln(),
            ScoreType::Aic => score -= q * (r - 1.0),
            _ => {}
        }
        score
    }
}

impl LocalScore for ScoreMetric<'_> {
    fn node_score(&self, node: usize, parents: &[usize]) -> Result<f64, SearchError> {
        let cardinalities = self.counts.cardinalities();
        let n_values = cardinalities[node];
        let n_configurations = parents
            .iter()
            .fold(1usize, |acc, &p| acc.saturating_mul(cardinalities[p]));

        let mut attributes = Vec::with_capacity(parents.len() + 1);
        attributes.extend_from_slice(parents);
        attributes.push(node);
        let counts = self.counts.counts(&attributes)?;

        Ok(self.score_of_counts(&counts, n_configurations, n_values))
    }
}
