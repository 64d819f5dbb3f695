//! Path resolution over a built [`ConfigTree`]
//!
//! A lookup walks one segment at a time. At each level every child whose match
//! set contains the segment is a candidate; candidates are ranked by how they
//! matched (own key, declared alias, wildcard) and every candidate is followed,
//! so several alias routes can contribute results to the same lookup.

use std::collections::{HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::tree::{ConfigNode, ConfigTree, NodeId, WILDCARD};
use crate::value::Value;

/// Score of a child whose own key equals the segment
pub const EXACT_SCORE: u32 = 1000;
/// Score of a child that matched through a declared alias
pub const ALIAS_SCORE: u32 = 100;
/// Score of a child that only matched through the wildcard
pub const WILDCARD_SCORE: u32 = 10;

/// Rank how `node` matches `segment`.
///
/// Returns 0 when the node does not match at all.
pub fn match_score(node: &ConfigNode, segment: &str) -> u32 {
    if node.key() == segment {
        EXACT_SCORE
    } else if segment != WILDCARD && node.matches().contains(segment) {
        ALIAS_SCORE
    } else if node.matches().contains(WILDCARD) && segment == WILDCARD {
        WILDCARD_SCORE
    } else {
        0
    }
}

/// Read-only lookups against a configuration tree
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    tree: &'a ConfigTree,
}

impl<'a> PathResolver<'a> {
    pub fn new(tree: &'a ConfigTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a ConfigTree {
        self.tree
    }

    /// All nodes reachable from `start` along `path`, best match first.
    ///
    /// An empty path yields `start` itself. Ties keep child insertion order.
    pub fn resolve_by_match_descending<S: AsRef<str>>(
        &self,
        start: NodeId,
        path: &[S],
    ) -> Vec<&'a ConfigNode> {
        let Some(start_node) = self.tree.get(start) else {
            return Vec::new();
        };
        if path.is_empty() {
            return vec![start_node];
        }

        let mut results = Vec::new();
        self.collect_matches(start_node, path, &mut results);
        results
    }

    fn collect_matches<S: AsRef<str>>(
        &self,
        node: &'a ConfigNode,
        path: &[S],
        results: &mut Vec<&'a ConfigNode>,
    ) {
        let Some((segment, rest)) = path.split_first() else {
            return;
        };
        let segment = segment.as_ref();

        let mut candidates: Vec<(u32, &'a ConfigNode)> = self
            .tree
            .children(node.id())
            .filter(|child| child.matches().contains(segment))
            .map(|child| (match_score(child, segment), child))
            .collect();
        // stable: equal scores keep insertion order
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, candidate) in candidates {
            if rest.is_empty() {
                results.push(candidate);
            } else {
                self.collect_matches(candidate, rest, results);
            }
        }
    }

    /// The best match for `path`, or `NotFound`
    pub fn resolve_best<S: AsRef<str>>(&self, start: NodeId, path: &[S]) -> Result<&'a ConfigNode> {
        self.resolve_by_match_descending(start, path)
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(join(path)))
    }

    /// Value of the best match, or `default` when nothing matches
    pub fn resolve_value<S: AsRef<str>>(&self, start: NodeId, path: &[S], default: Value) -> Value {
        match self.resolve_best(start, path) {
            Ok(node) => self.tree.value(node.id()).clone(),
            Err(_) => default,
        }
    }

    /// Values of every match, best first
    pub fn resolve_values<S: AsRef<str>>(&self, start: NodeId, path: &[S]) -> Vec<&'a Value> {
        let tree = self.tree;
        self.resolve_by_match_descending(start, path)
            .into_iter()
            .map(|node| tree.value(node.id()))
            .collect()
    }

    /// Shallowest nodes below (and including) `start` that answer to `key`.
    ///
    /// The walk is breadth-first, only follows children, and returns every
    /// match found at the first depth where one exists, in discovery order.
    /// Nothing deeper than that depth is ever returned.
    pub fn find_nearest_key_node(&self, start: NodeId, key: &str) -> Vec<&'a ConfigNode> {
        let mut found = Vec::new();
        let mut found_depth: Option<usize> = None;
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([(start, 0usize)]);

        while let Some((id, depth)) = queue.pop_front() {
            if found_depth.is_some_and(|d| depth > d) {
                break;
            }
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.tree.get(id) else {
                continue;
            };

            if node.matches().contains(key) {
                found_depth.get_or_insert(depth);
                found.push(node);
            }
            if found_depth.is_none() {
                queue.extend(node.children().iter().map(|c| (*c, depth + 1)));
            }
        }

        log::trace!(
            "Nearest '{}' from {}: {} node(s) at depth {:?}",
            key,
            start,
            found.len(),
            found_depth
        );
        found
    }

    /// First node of [`find_nearest_key_node`](Self::find_nearest_key_node),
    /// or `NotFound`
    pub fn nearest_key_node(&self, start: NodeId, key: &str) -> Result<&'a ConfigNode> {
        self.find_nearest_key_node(start, key)
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(key))
    }
}

fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(".")
}
