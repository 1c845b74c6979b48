//! Named, versioned structure files.
//!
//! A structure file lists, for every attribute, its name and the names of
//! its parents. Names are resolved against a dataset's schema when the file
//! is used, so a file can be applied to any dataset with matching attribute
//! names regardless of column order.

use std::path::Path;

use bayesnet_data::Attribute;
use tracing::{debug, info, instrument};

use crate::{SearchError, network::Network};

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized structure.
#[derive(serde::Serialize, serde::Deserialize)]
struct StructureEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// The structure itself.
    structure: StructureFile,
}

/// One attribute and the names of its parents.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeEntry {
    /// Attribute name.
    pub name: String,
    /// Parent attribute names, in parent order.
    pub parents: Vec<String>,
}

impl NodeEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, parents: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parents,
        }
    }
}

/// A network structure keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StructureFile {
    nodes: Vec<NodeEntry>,
}

impl StructureFile {
    /// Create a structure from its entries.
    #[must_use]
    pub fn new(nodes: Vec<NodeEntry>) -> Self {
        Self { nodes }
    }

    /// Describe `network` using the names in `attributes`.
    #[must_use]
    pub fn from_network(network: &Network, attributes: &[Attribute]) -> Self {
        let nodes = attributes
            .iter()
            .enumerate()
            .map(|(node, attribute)| NodeEntry {
                name: attribute.name().to_owned(),
                parents: network
                    .parents(node)
                    .iter()
                    .map(|&p| attributes[p].name().to_owned())
                    .collect(),
            })
            .collect();
        Self { nodes }
    }

    /// Return the entries.
    #[must_use]
    pub fn nodes(&self) -> &[NodeEntry] {
        &self.nodes
    }

    /// Return the total number of arcs.
    #[must_use]
    pub fn n_arcs(&self) -> usize {
        self.nodes.iter().map(|n| n.parents.len()).sum()
    }

    /// Save the structure to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::SerializeStructure`] | bincode encoding failed |
    /// | [`SearchError::WriteStructure`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SearchError> {
        let path = path.as_ref();

        let envelope = StructureEnvelope {
            format_version: FORMAT_VERSION,
            structure: self.clone(),
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| SearchError::SerializeStructure { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| SearchError::WriteStructure {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_nodes = self.nodes.len(),
            n_arcs = self.n_arcs(),
            "structure saved"
        );
        Ok(())
    }

    /// Load a structure from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::ReadStructure`] | file read failed |
    /// | [`SearchError::DeserializeStructure`] | bincode decoding failed |
    /// | [`SearchError::IncompatibleStructureVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| SearchError::ReadStructure {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: StructureEnvelope =
            bincode::deserialize(&bytes).map_err(|e| SearchError::DeserializeStructure {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(SearchError::IncompatibleStructureVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        debug!(
            n_nodes = envelope.structure.nodes.len(),
            n_arcs = envelope.structure.n_arcs(),
            "structure loaded"
        );
        Ok(envelope.structure)
    }
}

impl std::fmt::Display for StructureFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in &self.nodes {
            if node.parents.is_empty() {
                writeln!(f, "{}", node.name)?;
            } else {
                writeln!(f, "{} <- {}", node.name, node.parents.join(", "))?;
            }
        }
        Ok(())
    }
}
