//! Count providers for contingency-table queries.

use bayesnet_data::Dataset;

use crate::AdTreeError;

/// A provider of weighted joint counts over subsets of attributes.
///
/// Tables are dense and row-major in query order: for attributes
/// `[a0, a1, .., ak]` the cell of values `(v0, .., vk)` sits at
/// `Σ vi · stride_i` where the last attribute has stride 1 (see [`strides`]).
pub trait CountSource {
    /// Return the cardinality of every attribute the source covers.
    fn cardinalities(&self) -> &[usize];

    /// Add the weighted counts of `attributes` into `counts`.
    ///
    /// `offsets[i]` is the stride of `attributes[i]`; attributes may appear in
    /// any order but at most once.
    ///
    /// # Errors
    ///
    /// Returns an [`AdTreeError`] for unknown or repeated attributes,
    /// mismatched offsets, or a buffer too small for the addressed cells.
    fn add_counts(
        &self,
        counts: &mut [f64],
        attributes: &[usize],
        offsets: &[usize],
    ) -> Result<(), AdTreeError>;

    /// Return the dense contingency table of `attributes`.
    ///
    /// An empty query returns a single cell holding the total weight.
    ///
    /// # Errors
    ///
    /// Same as [`CountSource::add_counts`], plus
    /// [`AdTreeError::TableTooLarge`] when the table size overflows.
    fn counts(&self, attributes: &[usize]) -> Result<Vec<f64>, AdTreeError> {
        let (offsets, size) = strides(self.cardinalities(), attributes)?;
        let mut counts = vec![0.0; size];
        self.add_counts(&mut counts, attributes, &offsets)?;
        Ok(counts)
    }
}

/// Compute row-major strides and table size for a query.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AdTreeError::AttributeOutOfRange`] | an attribute has no cardinality |
/// | [`AdTreeError::DuplicateAttribute`] | an attribute is listed twice |
/// | [`AdTreeError::TableTooLarge`] | the cell count overflows `usize` |
pub fn strides(
    cardinalities: &[usize],
    attributes: &[usize],
) -> Result<(Vec<usize>, usize), AdTreeError> {
    validate_attributes(cardinalities, attributes)?;
    let mut offsets = vec![0usize; attributes.len()];
    let mut size = 1usize;
    for (i, &attribute) in attributes.iter().enumerate().rev() {
        offsets[i] = size;
        size = size
            .checked_mul(cardinalities[attribute])
            .ok_or(AdTreeError::TableTooLarge {
                n_attributes: attributes.len(),
            })?;
    }
    Ok((offsets, size))
}

/// Check that every attribute is known and appears once.
pub(crate) fn validate_attributes(
    cardinalities: &[usize],
    attributes: &[usize],
) -> Result<(), AdTreeError> {
    for (i, &attribute) in attributes.iter().enumerate() {
        if attribute >= cardinalities.len() {
            return Err(AdTreeError::AttributeOutOfRange {
                attribute,
                n_attributes: cardinalities.len(),
            });
        }
        if attributes[..i].contains(&attribute) {
            return Err(AdTreeError::DuplicateAttribute { attribute });
        }
    }
    Ok(())
}

/// Check that `offsets` pairs with `attributes` and that every addressable
/// cell fits in a buffer of `len` cells.
pub(crate) fn validate_buffer(
    cardinalities: &[usize],
    attributes: &[usize],
    offsets: &[usize],
    len: usize,
) -> Result<(), AdTreeError> {
    if attributes.len() != offsets.len() {
        return Err(AdTreeError::OffsetCountMismatch {
            nodes: attributes.len(),
            offsets: offsets.len(),
        });
    }
    let mut last = 0usize;
    for (&attribute, &offset) in attributes.iter().zip(offsets) {
        let span = offset
            .checked_mul(cardinalities[attribute].saturating_sub(1))
            .and_then(|s| last.checked_add(s))
            .ok_or(AdTreeError::TableTooLarge {
                n_attributes: attributes.len(),
            })?;
        last = span;
    }
    if last >= len {
        return Err(AdTreeError::CountBufferTooSmall {
            required: last + 1,
            got: len,
        });
    }
    Ok(())
}

/// Brute-force [`CountSource`] that scans every row of a dataset per query.
///
/// Used when no AD-tree is built and as the reference the tree is checked
/// against.
#[derive(Debug, Clone)]
pub struct ScanCounter<'a> {
    data: &'a Dataset,
    cardinalities: Vec<usize>,
}

impl<'a> ScanCounter<'a> {
    /// Wrap a dataset.
    #[must_use]
    pub fn new(data: &'a Dataset) -> Self {
        Self {
            data,
            cardinalities: data.cardinalities(),
        }
    }
}

impl CountSource for ScanCounter<'_> {
    fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    fn add_counts(
        &self,
        counts: &mut [f64],
        attributes: &[usize],
        offsets: &[usize],
    ) -> Result<(), AdTreeError> {
        validate_attributes(&self.cardinalities, attributes)?;
        validate_buffer(&self.cardinalities, attributes, offsets, counts.len())?;
        for (row_index, row) in self.data.rows().enumerate() {
            let cell: usize = attributes
                .iter()
                .zip(offsets)
                .map(|(&a, &o)| row[a] * o)
                .sum();
            counts[cell] += self.data.weight(row_index);
        }
        Ok(())
    }
}
