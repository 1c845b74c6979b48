//! Nominal attribute schema.

use crate::DataError;

/// A nominal attribute: a name and an ordered list of value labels.
///
/// Values are referred to by their zero-based position in the label list,
/// so the cardinality of the attribute is the number of labels.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    name: String,
    values: Vec<String>,
}

impl Attribute {
    /// Create a new attribute.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::EmptyAttributeName`] | `name` is empty |
    /// | [`DataError::NoValues`] | `values` is empty |
    /// | [`DataError::DuplicateValue`] | a label appears twice |
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DataError::EmptyAttributeName);
        }
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(DataError::NoValues { name });
        }
        for (i, label) in values.iter().enumerate() {
            if values[..i].contains(label) {
                return Err(DataError::DuplicateValue {
                    name,
                    label: label.clone(),
                });
            }
        }
        Ok(Self { name, values })
    }

    /// Create an attribute with `cardinality` values labelled `v0`, `v1`, ...
    ///
    /// # Errors
    ///
    /// Same as [`Attribute::new`].
    pub fn with_cardinality(name: impl Into<String>, cardinality: usize) -> Result<Self, DataError> {
        Self::new(name, (0..cardinality).map(|v| format!("v{v}")))
    }

    /// Return the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the value labels in index order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Return the number of distinct values.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.values.len()
    }

    /// Return the index of `label`, if the attribute declares it.
    #[must_use]
    pub fn value_index(&self, label: &str) -> Option<usize> {
        self.values.iter().position(|v| v == label)
    }

    /// Return the label for value index `value`.
    #[must_use]
    pub fn value_label(&self, value: usize) -> Option<&str> {
        self.values.get(value).map(String::as_str)
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {{{}}}", self.name, self.values.join(","))
    }
}
