use bayesnet_data::Dataset;
use tracing::{debug, info, instrument};

use super::{SearchContext, SearchStrategy};
use crate::{SearchError, network::Network, structure_file::StructureFile};

/// A structure supplied up front rather than searched for.
///
/// The structure file is resolved against the dataset's schema when the
/// strategy is built, so unknown names and cycles are reported before any
/// search state exists. Searching replaces every parent set.
#[derive(Debug, Clone)]
pub struct FixedStructure {
    network: Network,
}

impl FixedStructure {
    /// Resolve `file` against the attributes of `data`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::UnknownAttribute`] | a node or parent name is not in the dataset |
    /// | [`SearchError::DuplicateEntry`] | an attribute has two entries |
    /// | [`SearchError::MissingAttribute`] | a dataset attribute has no entry |
    /// | [`SearchError::DuplicateParent`] | a parent is listed twice for one node |
    /// | [`SearchError::SelfLoop`] | a node lists itself as a parent |
    /// | [`SearchError::CyclicStructure`] | the arcs contain a directed cycle |
    #[instrument(skip_all, fields(n_nodes = file.nodes().len()))]
    pub fn resolve(file: &StructureFile, data: &Dataset) -> Result<Self, SearchError> {
        let lookup = |name: &str| {
            data.attribute_index(name)
                .ok_or_else(|| SearchError::UnknownAttribute {
                    name: name.to_owned(),
                })
        };

        let mut arcs = Vec::with_capacity(file.n_arcs());
        let mut seen = vec![false; data.n_attributes()];
        for entry in file.nodes() {
            let node = lookup(&entry.name)?;
            if seen[node] {
                return Err(SearchError::DuplicateEntry {
                    name: entry.name.clone(),
                });
            }
            seen[node] = true;

            for (i, parent_name) in entry.parents.iter().enumerate() {
                let parent = lookup(parent_name)?;
                if parent == node {
                    return Err(SearchError::SelfLoop { node });
                }
                if entry.parents[..i].contains(parent_name) {
                    return Err(SearchError::DuplicateParent {
                        node: entry.name.clone(),
                        parent: parent_name.clone(),
                    });
                }
                arcs.push((node, parent));
            }
        }

        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(SearchError::MissingAttribute {
                name: data.attribute(missing).name().to_owned(),
            });
        }

        let mut network = Network::for_dataset(data);
        for &(node, parent) in &arcs {
            if !network.can_add_arc(node, parent) {
                return Err(SearchError::CyclicStructure {
                    node: data.attribute(node).name().to_owned(),
                    parent: data.attribute(parent).name().to_owned(),
                });
            }
            network.add_parent(node, parent);
        }

        debug!(n_arcs = network.n_arcs(), "structure resolved");
        Ok(Self { network })
    }

    /// Return the resolved network.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }
}

impl SearchStrategy for FixedStructure {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn search(&self, network: &mut Network, _ctx: &SearchContext<'_>) -> Result<(), SearchError> {
        network.copy_parent_sets_from(&self.network);
        info!(n_arcs = network.n_arcs(), "fixed structure applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bayesnet_data::{Attribute, DatasetBuilder};

    use super::*;
    use crate::structure_file::NodeEntry;

    fn data() -> Dataset {
        DatasetBuilder::new(vec![
            Attribute::with_cardinality("a", 2).unwrap(),
            Attribute::with_cardinality("b", 3).unwrap(),
            Attribute::with_cardinality("class", 2).unwrap(),
        ])
        .unwrap()
        .build()
    }

    fn entry(name: &str, parents: &[&str]) -> NodeEntry {
        NodeEntry::new(name, parents.iter().map(|p| (*p).to_owned()).collect())
    }

    #[test]
    fn resolves_names_in_any_order() {
        let file = StructureFile::new(vec![
            entry("class", &[]),
            entry("b", &["class", "a"]),
            entry("a", &["class"]),
        ]);
        let fixed = FixedStructure::resolve(&file, &data()).unwrap();
        assert_eq!(fixed.network().parents(1), &[2, 0]);
        assert_eq!(fixed.network().parents(0), &[2]);
        assert_eq!(fixed.network().parent_set(1).cardinality_of_parents(), 4);
    }

    #[test]
    fn unknown_name_fails() {
        let file = StructureFile::new(vec![
            entry("a", &["zzz"]),
            entry("b", &[]),
            entry("class", &[]),
        ]);
        let err = FixedStructure::resolve(&file, &data()).unwrap_err();
        assert!(matches!(err, SearchError::UnknownAttribute { name } if name == "zzz"));
    }

    #[test]
    fn missing_entry_fails() {
        let file = StructureFile::new(vec![entry("a", &[]), entry("class", &[])]);
        let err = FixedStructure::resolve(&file, &data()).unwrap_err();
        assert!(matches!(err, SearchError::MissingAttribute { name } if name == "b"));
    }

    #[test]
    fn duplicate_entry_fails() {
        let file = StructureFile::new(vec![
            entry("a", &[]),
            entry("a", &[]),
            entry("b", &[]),
            entry("class", &[]),
        ]);
        let err = FixedStructure::resolve(&file, &data()).unwrap_err();
        assert!(matches!(err, SearchError::DuplicateEntry { .. }));
    }

    #[test]
    fn duplicate_parent_and_self_loop_fail() {
        let dup = StructureFile::new(vec![
            entry("a", &["b", "b"]),
            entry("b", &[]),
            entry("class", &[]),
        ]);
        assert!(matches!(
            FixedStructure::resolve(&dup, &data()).unwrap_err(),
            SearchError::DuplicateParent { .. }
        ));

        let own = StructureFile::new(vec![entry("a", &["a"]), entry("b", &[]), entry("class", &[])]);
        assert!(matches!(
            FixedStructure::resolve(&own, &data()).unwrap_err(),
            SearchError::SelfLoop { node: 0 }
        ));
    }

    #[test]
    fn cycle_fails() {
        let file = StructureFile::new(vec![
            entry("a", &["b"]),
            entry("b", &["class"]),
            entry("class", &["a"]),
        ]);
        let err = FixedStructure::resolve(&file, &data()).unwrap_err();
        assert!(matches!(err, SearchError::CyclicStructure { .. }));
    }
}
