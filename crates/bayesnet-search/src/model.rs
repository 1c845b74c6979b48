//! A fitted Bayesian network classifier.

use std::path::Path;

use bayesnet_data::Attribute;

use crate::{
    SearchError, estimator::ConditionalTable, markov::MarkovCorrection, network::Network,
    structure_file::StructureFile,
};

/// A learned structure with one conditional probability table per node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BayesNet {
    attributes: Vec<Attribute>,
    class_index: usize,
    network: Network,
    tables: Vec<ConditionalTable>,
    markov_correction: Option<MarkovCorrection>,
}

impl BayesNet {
    pub(crate) fn new(
        attributes: Vec<Attribute>,
        class_index: usize,
        network: Network,
        tables: Vec<ConditionalTable>,
        markov_correction: Option<MarkovCorrection>,
    ) -> Self {
        Self {
            attributes,
            class_index,
            network,
            tables,
            markov_correction,
        }
    }

    /// Return the learned structure.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Return the per-node tables, indexed by node.
    #[must_use]
    pub fn tables(&self) -> &[ConditionalTable] {
        &self.tables
    }

    /// Return the schema the model was trained on.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Return the class attribute index.
    #[must_use]
    pub fn class_index(&self) -> usize {
        self.class_index
    }

    /// Return the arcs added by Markov-blanket correction and the nodes it
    /// had to skip, or `None` when correction was not enabled.
    #[must_use]
    pub fn markov_correction(&self) -> Option<&MarkovCorrection> {
        self.markov_correction.as_ref()
    }

    /// Describe the structure by attribute name.
    #[must_use]
    pub fn structure(&self) -> StructureFile {
        StructureFile::from_network(&self.network, &self.attributes)
    }

    /// Return the normalized class distribution for `row`.
    ///
    /// `row` holds one value per attribute; the class entry is ignored.
    /// Each class value is scored by the sum over nodes of
    /// `ln P(node | parents)` with that class value substituted.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::RowLengthMismatch`] | `row` does not have one value per attribute |
    /// | [`SearchError::ValueOutOfRange`] | a non-class value exceeds its attribute's range |
    pub fn predict_proba(&self, row: &[usize]) -> Result<Vec<f64>, SearchError> {
        if row.len() != self.attributes.len() {
            return Err(SearchError::RowLengthMismatch {
                expected: self.attributes.len(),
                got: row.len(),
            });
        }
        for (attribute, &value) in row.iter().enumerate() {
            let cardinality = self.network.cardinality(attribute);
            if attribute != self.class_index && value >= cardinality {
                return Err(SearchError::ValueOutOfRange {
                    attribute,
                    value,
                    cardinality,
                });
            }
        }

        let cardinalities = self.network.cardinalities();
        let mut instance = row.to_vec();
        let mut log_probs: Vec<f64> = (0..cardinalities[self.class_index])
            .map(|class_value| {
                instance[self.class_index] = class_value;
                self.tables
                    .iter()
                    .map(|table| {
                        let configuration = table.configuration(&instance, cardinalities);
                        table.probability(configuration, instance[table.node()]).ln()
                    })
                    .sum()
            })
            .collect();

        let max = log_probs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            let uniform = 1.0 / log_probs.len() as f64;
            return Ok(vec![uniform; log_probs.len()]);
        }
        let mut total = 0.0;
        for p in &mut log_probs {
            *p = (*p - max).exp();
            total += *p;
        }
        for p in &mut log_probs {
            *p /= total;
        }
        Ok(log_probs)
    }

    /// Return the most probable class value for `row`. Ties go to the lowest index.
    ///
    /// # Errors
    ///
    /// Same as [`BayesNet::predict_proba`].
    pub fn predict(&self, row: &[usize]) -> Result<usize, SearchError> {
        let proba = self.predict_proba(row)?;
        let mut best = 0;
        for (class_value, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = class_value;
            }
        }
        Ok(best)
    }

    /// Write the structure to a structure file.
    ///
    /// # Errors
    ///
    /// Same as [`StructureFile::save`].
    pub fn save_structure(&self, path: impl AsRef<Path>) -> Result<(), SearchError> {
        self.structure().save(path)
    }
}
