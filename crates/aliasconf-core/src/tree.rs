//! Configuration tree
//!
//! A built configuration lives in an arena: the tree owns every node, a node
//! lists its children by id, and the parent link is a plain id used for
//! lookups only. The tree also owns the configuration value, with every
//! `aliases` entry removed; a node records only its position inside its
//! parent's container, and [`ConfigTree::value`] walks there on demand.
//! Trees are immutable once [`TreeBuilder`](crate::builder::TreeBuilder)
//! returns them.

use std::collections::VecDeque;
use std::fmt;

use indexmap::IndexSet;

use crate::error::Result;
use crate::value::Value;

/// Token present in every node's match set
pub const WILDCARD: &str = "*";

/// Reserved mapping key declaring alternative names for a node
pub const ALIASES_KEY: &str = "aliases";

/// Stable handle of a node inside its [`ConfigTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the tree's arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single node of a configuration tree
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    pub(crate) id: NodeId,
    pub(crate) key: String,
    pub(crate) index: Option<usize>,
    /// Position among the entries of the parent's mapping or sequence
    pub(crate) slot: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) matches: IndexSet<String>,
}

impl ConfigNode {
    pub(crate) fn new(id: NodeId, key: String, index: Option<usize>, slot: usize) -> Self {
        let mut matches = IndexSet::new();
        matches.insert(key.clone());
        matches.insert(WILDCARD.to_string());
        Self {
            id,
            key,
            index,
            slot,
            parent: None,
            children: Vec::new(),
            matches,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's key; sequence elements use their decimal position
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Original position for nodes derived from a sequence element
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Every string this node answers to: its key, `*`, and declared aliases
    pub fn matches(&self) -> &IndexSet<String> {
        &self.matches
    }

    /// Declared aliases only, in declaration order
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.matches
            .iter()
            .map(String::as_str)
            .filter(move |m| *m != self.key && *m != WILDCARD)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Shape summary of a built tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    pub node_count: usize,
    /// Number of levels, root included
    pub max_depth: usize,
    pub leaf_count: usize,
    pub total_matches: usize,
}

/// An immutable, arena-backed configuration tree
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    pub(crate) nodes: Vec<ConfigNode>,
    /// The whole configuration, `aliases` entries removed at every depth
    pub(crate) value: Value,
}

static NULL: Value = Value::Null;

impl ConfigTree {
    /// Build a tree from a merged configuration value
    pub fn build(value: Value) -> Result<Self> {
        crate::builder::TreeBuilder::new().build(value)
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> &ConfigNode {
        &self.nodes[0]
    }

    /// The value below `id`, with `aliases` stripped at every depth
    pub fn value(&self, id: NodeId) -> &Value {
        let Some(mut node) = self.get(id) else {
            return &NULL;
        };
        let mut slots = Vec::new();
        while let Some(parent) = node.parent {
            slots.push(node.slot);
            node = self.node(parent);
        }

        let mut value = &self.value;
        for slot in slots.into_iter().rev() {
            let next = match value {
                Value::Mapping(map) => map.get_index(slot).map(|(_, v)| v),
                Value::Sequence(seq) => seq.get(slot),
                _ => None,
            };
            value = next.unwrap_or(&NULL);
        }
        value
    }

    /// The whole configuration value, `aliases` stripped at every depth
    pub fn root_value(&self) -> &Value {
        &self.value
    }

    /// Look up a node; ids always come from this tree, so this only fails
    /// for ids of another tree
    pub fn get(&self, id: NodeId) -> Option<&ConfigNode> {
        self.nodes.get(id.0)
    }

    /// Look up a node by id, panicking on a foreign id
    pub fn node(&self, id: NodeId) -> &ConfigNode {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<&ConfigNode> {
        self.get(id)?.parent.map(|p| self.node(p))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ConfigNode> {
        self.get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |c| self.node(*c))
    }

    /// All nodes in creation (breadth-first) order
    pub fn iter(&self) -> impl Iterator<Item = &ConfigNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distance from the root (root is 0)
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(p) = current {
            depth += 1;
            current = self.node(p).parent;
        }
        depth
    }

    /// Keys from the root down to `id`, root key included
    pub fn path_of(&self, id: NodeId) -> Vec<String> {
        let mut keys = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            keys.push(node.key.clone());
            current = node.parent.map(|p| self.node(p));
        }
        keys.reverse();
        keys
    }

    /// Dotted form of [`path_of`](Self::path_of), used in error messages
    pub fn dotted_path(&self, id: NodeId) -> String {
        self.path_of(id).join(".")
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            node_count: self.nodes.len(),
            ..TreeStats::default()
        };
        if self.nodes.is_empty() {
            return stats;
        }

        let mut queue = VecDeque::from([(self.root_id(), 1usize)]);
        while let Some((id, level)) = queue.pop_front() {
            let node = self.node(id);
            stats.max_depth = stats.max_depth.max(level);
            stats.total_matches += node.matches.len();
            if node.is_leaf() {
                stats.leaf_count += 1;
            }
            queue.extend(node.children.iter().map(|c| (*c, level + 1)));
        }
        stats
    }

    /// Report parent/child links that disagree with each other.
    ///
    /// A tree produced by the builder always yields an empty list.
    pub fn check_integrity(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Some(parent) = self.nodes.first().and_then(|root| root.parent) {
            problems.push(format!("root has parent {}", parent));
        }

        for node in &self.nodes {
            if !node.matches.contains(&node.key) || !node.matches.contains(WILDCARD) {
                problems.push(format!("node {} is missing its key or wildcard match", node.id));
            }
            if let Some(parent) = node.parent {
                match self.get(parent) {
                    None => problems.push(format!(
                        "node {} references missing parent {}",
                        node.id, parent
                    )),
                    Some(p) if !p.children.contains(&node.id) => problems.push(format!(
                        "node {} is not listed among the children of {}",
                        node.id, parent
                    )),
                    Some(_) => {}
                }
            }
            for child in &node.children {
                match self.get(*child) {
                    None => problems.push(format!(
                        "node {} references missing child {}",
                        node.id, child
                    )),
                    Some(c) if c.parent != Some(node.id) => problems.push(format!(
                        "child {} does not point back to {}",
                        child, node.id
                    )),
                    Some(_) => {}
                }
            }
        }
        problems
    }
}
