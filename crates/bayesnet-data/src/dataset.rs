//! Validated discrete dataset and its builder.

use tracing::debug;

use crate::{Attribute, DataError};

/// A fully materialized table of discrete values.
///
/// Rows are stored row-major as value indices: `value(row, attribute)` is
/// always below `cardinality(attribute)`. Every row carries a non-negative
/// weight (1.0 unless set otherwise). Exactly one attribute is the class.
///
/// Construct via [`DatasetBuilder`]; a built dataset is immutable.
#[derive(Debug, Clone)]
pub struct Dataset {
    attributes: Vec<Attribute>,
    values: Vec<usize>,
    weights: Vec<f64>,
    class_index: usize,
}

impl Dataset {
    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.weights.len()
    }

    /// Return `true` when the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Return the number of attributes (columns), class included.
    #[must_use]
    pub fn n_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Return the attribute schema.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Return the attribute at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index >= n_attributes()`.
    #[must_use]
    pub fn attribute(&self, index: usize) -> &Attribute {
        &self.attributes[index]
    }

    /// Return the index of the attribute called `name`.
    #[must_use]
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name() == name)
    }

    /// Return the number of values of attribute `index`.
    #[must_use]
    pub fn cardinality(&self, index: usize) -> usize {
        self.attributes[index].cardinality()
    }

    /// Return the cardinality of every attribute in schema order.
    #[must_use]
    pub fn cardinalities(&self) -> Vec<usize> {
        self.attributes.iter().map(Attribute::cardinality).collect()
    }

    /// Return the index of the class attribute.
    #[must_use]
    pub fn class_index(&self) -> usize {
        self.class_index
    }

    /// Return the value index of `attribute` in `row`.
    #[must_use]
    pub fn value(&self, row: usize, attribute: usize) -> usize {
        self.values[row * self.attributes.len() + attribute]
    }

    /// Return all value indices of `row`.
    #[must_use]
    pub fn row(&self, row: usize) -> &[usize] {
        let width = self.attributes.len();
        &self.values[row * width..(row + 1) * width]
    }

    /// Iterate over the rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[usize]> + '_ {
        self.values.chunks_exact(self.attributes.len())
    }

    /// Return the weight of `row`.
    #[must_use]
    pub fn weight(&self, row: usize) -> f64 {
        self.weights[row]
    }

    /// Return the sum of all row weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Incremental, validating constructor for [`Dataset`].
///
/// The class attribute defaults to the last attribute of the schema.
///
/// ```
/// use bayesnet_data::{Attribute, DatasetBuilder};
///
/// let attributes = vec![
///     Attribute::new("windy", ["true", "false"]).unwrap(),
///     Attribute::new("play", ["yes", "no"]).unwrap(),
/// ];
/// let mut builder = DatasetBuilder::new(attributes).unwrap();
/// builder.push_labels(&["true", "no"]).unwrap();
/// builder.push_row(&[1, 0]).unwrap();
/// let data = builder.build();
/// assert_eq!(data.n_rows(), 2);
/// assert_eq!(data.class_index(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    attributes: Vec<Attribute>,
    class_index: usize,
    values: Vec<usize>,
    weights: Vec<f64>,
}

impl DatasetBuilder {
    /// Start a dataset over the given schema.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::NoAttributes`] | `attributes` is empty |
    /// | [`DataError::DuplicateAttribute`] | two attributes share a name |
    pub fn new(attributes: Vec<Attribute>) -> Result<Self, DataError> {
        if attributes.is_empty() {
            return Err(DataError::NoAttributes);
        }
        for (i, attr) in attributes.iter().enumerate() {
            if attributes[..i].iter().any(|a| a.name() == attr.name()) {
                return Err(DataError::DuplicateAttribute {
                    name: attr.name().to_string(),
                });
            }
        }
        let class_index = attributes.len() - 1;
        Ok(Self {
            attributes,
            class_index,
            values: Vec::new(),
            weights: Vec::new(),
        })
    }

    /// Designate the class attribute.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ClassIndexOutOfRange`] if `class_index` does not
    /// name an attribute.
    pub fn with_class_index(mut self, class_index: usize) -> Result<Self, DataError> {
        if class_index >= self.attributes.len() {
            return Err(DataError::ClassIndexOutOfRange {
                class_index,
                n_attributes: self.attributes.len(),
            });
        }
        self.class_index = class_index;
        Ok(self)
    }

    /// Append a row of value indices with weight 1.0.
    ///
    /// # Errors
    ///
    /// See [`DatasetBuilder::push_weighted_row`].
    pub fn push_row(&mut self, row: &[usize]) -> Result<(), DataError> {
        self.push_weighted_row(row, 1.0)
    }

    /// Append a row of value indices with an explicit weight.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::RowLengthMismatch`] | `row.len()` differs from the schema width |
    /// | [`DataError::ValueOutOfRange`] | a value is not below its attribute cardinality |
    /// | [`DataError::InvalidWeight`] | `weight` is negative, NaN, or infinite |
    pub fn push_weighted_row(&mut self, row: &[usize], weight: f64) -> Result<(), DataError> {
        let row_index = self.weights.len();
        if row.len() != self.attributes.len() {
            return Err(DataError::RowLengthMismatch {
                row_index,
                expected: self.attributes.len(),
                got: row.len(),
            });
        }
        for (attr, &value) in self.attributes.iter().zip(row) {
            if value >= attr.cardinality() {
                return Err(DataError::ValueOutOfRange {
                    row_index,
                    attribute: attr.name().to_string(),
                    value,
                    cardinality: attr.cardinality(),
                });
            }
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(DataError::InvalidWeight { row_index, weight });
        }
        self.values.extend_from_slice(row);
        self.weights.push(weight);
        Ok(())
    }

    /// Append a row given as value labels, with weight 1.0.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::RowLengthMismatch`] | `labels.len()` differs from the schema width |
    /// | [`DataError::UnknownValue`] | a label is not declared by its attribute |
    pub fn push_labels(&mut self, labels: &[&str]) -> Result<(), DataError> {
        let row_index = self.weights.len();
        if labels.len() != self.attributes.len() {
            return Err(DataError::RowLengthMismatch {
                row_index,
                expected: self.attributes.len(),
                got: labels.len(),
            });
        }
        let row = self
            .attributes
            .iter()
            .zip(labels)
            .map(|(attr, label)| {
                attr.value_index(label).ok_or_else(|| DataError::UnknownValue {
                    row_index,
                    attribute: attr.name().to_string(),
                    label: (*label).to_string(),
                })
            })
            .collect::<Result<Vec<usize>, DataError>>()?;
        self.push_row(&row)
    }

    /// Return the number of rows pushed so far.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.weights.len()
    }

    /// Finish the dataset.
    #[must_use]
    pub fn build(self) -> Dataset {
        debug!(
            n_rows = self.weights.len(),
            n_attributes = self.attributes.len(),
            class_index = self.class_index,
            "dataset built"
        );
        Dataset {
            attributes: self.attributes,
            values: self.values,
            weights: self.weights,
            class_index: self.class_index,
        }
    }
}
