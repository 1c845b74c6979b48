/// Errors from AD-tree count queries.
#[derive(Debug, thiserror::Error)]
pub enum AdTreeError {
    /// Returned when a query names an attribute the dataset does not have.
    #[error("attribute {attribute} out of range for {n_attributes} attributes")]
    AttributeOutOfRange {
        /// The offending attribute index.
        attribute: usize,
        /// Number of attributes the counts were built over.
        n_attributes: usize,
    },

    /// Returned when a query names the same attribute twice.
    #[error("attribute {attribute} appears more than once in the query")]
    DuplicateAttribute {
        /// The repeated attribute index.
        attribute: usize,
    },

    /// Returned when a raw tree query lists attributes out of ascending order.
    #[error("query attributes must be strictly ascending, violated at position {position}")]
    NotAscending {
        /// Zero-based position of the first out-of-order attribute.
        position: usize,
    },

    /// Returned when the number of strides differs from the number of attributes.
    #[error("query has {nodes} attributes but {offsets} offsets")]
    OffsetCountMismatch {
        /// Number of attributes in the query.
        nodes: usize,
        /// Number of offsets in the query.
        offsets: usize,
    },

    /// Returned when the output buffer cannot hold every addressable cell.
    #[error("count buffer holds {got} cells, query addresses {required}")]
    CountBufferTooSmall {
        /// Cells the query may write to.
        required: usize,
        /// Length of the supplied buffer.
        got: usize,
    },

    /// Returned when the product of the queried cardinalities overflows.
    #[error("contingency table over {n_attributes} attributes is too large to allocate")]
    TableTooLarge {
        /// Number of attributes in the query.
        n_attributes: usize,
    },
}
