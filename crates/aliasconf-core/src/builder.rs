//! Tree construction
//!
//! Expands a merged [`Value`] into a [`ConfigTree`]. Traversal uses an explicit
//! work queue so arbitrarily deep configuration does not grow the call stack,
//! and `aliases` entries are stripped from the owned input as each node is
//! created.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::tree::{ConfigNode, ConfigTree, NodeId, ALIASES_KEY};
use crate::value::Value;

/// Key of the synthetic root node unless configured otherwise
pub const DEFAULT_ROOT_KEY: &str = "root";

/// Builds [`ConfigTree`]s from merged configuration values
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root_key: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            root_key: DEFAULT_ROOT_KEY.to_string(),
        }
    }

    /// Use a different key for the synthetic root node
    pub fn with_root_key(mut self, root_key: impl Into<String>) -> Self {
        self.root_key = root_key.into();
        self
    }

    /// Build a tree; the value must be a mapping.
    ///
    /// Fails with `InvalidRoot` for any other top-level value, with
    /// `InvalidAliases` when an `aliases` entry is not a list of strings, and
    /// with `DuplicateEdge` if a child would be attached twice. No partial tree
    /// is ever returned.
    ///
    /// The input is consumed: `aliases` entries are removed from it in place
    /// while the nodes are created, and the stripped value is handed to the
    /// tree without copying any subtree.
    pub fn build(&self, mut value: Value) -> Result<ConfigTree> {
        if !value.is_mapping() {
            return Err(Error::invalid_root(value.type_name()));
        }

        let mut tree = ConfigTree {
            nodes: Vec::new(),
            value: Value::Null,
        };
        let root = push_node(&mut tree, None, self.root_key.clone(), None, 0, &mut value)?;

        let mut queue: VecDeque<(NodeId, &mut Value)> = VecDeque::from([(root, &mut value)]);
        while let Some((current, current_value)) = queue.pop_front() {
            let entries = child_entries(current_value);
            for (slot, (key, index, child_value)) in entries.into_iter().enumerate() {
                let child = push_node(&mut tree, Some(current), key, index, slot, child_value)?;
                attach(&mut tree, current, child)?;
                if !child_value.is_scalar() {
                    queue.push_back((child, child_value));
                }
            }
        }

        tree.value = value;
        log::debug!(
            "Built configuration tree with {} nodes under '{}'",
            tree.len(),
            self.root_key
        );
        Ok(tree)
    }
}

/// Create a node, moving any `aliases` entry of a mapping value into the
/// node's match set. The node is not attached yet.
fn push_node(
    tree: &mut ConfigTree,
    parent: Option<NodeId>,
    key: String,
    index: Option<usize>,
    slot: usize,
    value: &mut Value,
) -> Result<NodeId> {
    let declared = value
        .as_mapping_mut()
        .and_then(|map| map.shift_remove(ALIASES_KEY));
    let mut node = ConfigNode::new(NodeId(tree.nodes.len()), key, index, slot);

    if let Some(declared) = declared {
        let names = declared.as_string_list().ok_or_else(|| {
            let path = match parent {
                Some(p) => format!("{}.{}", tree.dotted_path(p), node.key),
                None => node.key.clone(),
            };
            Error::invalid_aliases(path, declared.to_string())
        })?;
        for alias in names {
            log::trace!("Node '{}' answers to alias '{}'", node.key, alias);
            node.matches.insert(alias);
        }
    }

    let id = node.id;
    tree.nodes.push(node);
    Ok(id)
}

/// Record `child` under `parent`.
///
/// A child may have exactly one parent and appear once in its list.
fn attach(tree: &mut ConfigTree, parent: NodeId, child: NodeId) -> Result<()> {
    let already_linked = tree.node(child).parent.is_some()
        || tree.node(parent).children.contains(&child);
    if already_linked {
        return Err(Error::duplicate_edge(child.0, Some(tree.dotted_path(parent))));
    }
    tree.nodes[child.0].parent = Some(parent);
    tree.nodes[parent.0].children.push(child);
    Ok(())
}

/// Entries of a container value that become child nodes, in order
fn child_entries(value: &mut Value) -> Vec<(String, Option<usize>, &mut Value)> {
    match value {
        Value::Mapping(map) => map
            .iter_mut()
            .map(|(k, v)| (k.clone(), None, v))
            .collect(),
        Value::Sequence(seq) => seq
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (i.to_string(), Some(i), v))
            .collect(),
        _ => Vec::new(),
    }
}
