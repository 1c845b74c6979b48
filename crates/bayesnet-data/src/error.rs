//! Error types for bayesnet-data.

/// Errors from schema construction and dataset validation.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Returned when a schema has zero attributes.
    #[error("dataset schema has zero attributes")]
    NoAttributes,

    /// Returned when an attribute name is empty.
    #[error("attribute names must not be empty")]
    EmptyAttributeName,

    /// Returned when an attribute declares zero values.
    #[error("attribute \"{name}\" declares zero values")]
    NoValues {
        /// Name of the offending attribute.
        name: String,
    },

    /// Returned when an attribute declares the same value label twice.
    #[error("attribute \"{name}\" declares value \"{label}\" more than once")]
    DuplicateValue {
        /// Name of the offending attribute.
        name: String,
        /// The repeated value label.
        label: String,
    },

    /// Returned when two attributes share a name.
    #[error("attribute name \"{name}\" appears more than once")]
    DuplicateAttribute {
        /// The repeated attribute name.
        name: String,
    },

    /// Returned when the class index does not name an attribute.
    #[error("class index {class_index} out of range for {n_attributes} attributes")]
    ClassIndexOutOfRange {
        /// The requested class index.
        class_index: usize,
        /// Number of attributes in the schema.
        n_attributes: usize,
    },

    /// Returned when a row has a different number of values than the schema.
    #[error("row {row_index} has {got} values, expected {expected}")]
    RowLengthMismatch {
        /// Zero-based index of the offending row.
        row_index: usize,
        /// Number of attributes in the schema.
        expected: usize,
        /// Number of values in the row.
        got: usize,
    },

    /// Returned when a value index is not below the attribute cardinality.
    #[error("row {row_index}: value {value} out of range for attribute \"{attribute}\" with {cardinality} values")]
    ValueOutOfRange {
        /// Zero-based index of the offending row.
        row_index: usize,
        /// Name of the attribute.
        attribute: String,
        /// The offending value index.
        value: usize,
        /// Number of values the attribute declares.
        cardinality: usize,
    },

    /// Returned when a value label is not declared by its attribute.
    #[error("row {row_index}: unknown value \"{label}\" for attribute \"{attribute}\"")]
    UnknownValue {
        /// Zero-based index of the offending row.
        row_index: usize,
        /// Name of the attribute.
        attribute: String,
        /// The undeclared label.
        label: String,
    },

    /// Returned when a row weight is negative, NaN, or infinite.
    #[error("row {row_index} has invalid weight {weight}")]
    InvalidWeight {
        /// Zero-based index of the offending row.
        row_index: usize,
        /// The rejected weight.
        weight: f64,
    },
}
