//! The trie adjacency matrix and the decoded double-array, plus their JSON forms.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Node index into a [`TrieMatrix`].
pub type NodeId = usize;

/// An ordered adjacency list of a trie: `edges[u]` is the list of `(label, child)`
/// pairs leaving node `u`. Node 0 is the root. Labels within a single node's edge
/// list are unique, but need not be sorted on disk.
#[derive(Debug, Clone)]
pub struct TrieMatrix {
    edges: Vec<Vec<(u8, NodeId)>>,
}

impl TrieMatrix {
    pub fn new(edges: Vec<Vec<(u8, NodeId)>>) -> Self {
        TrieMatrix { edges }
    }

    pub fn num_nodes(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self, u: NodeId) -> &[(u8, NodeId)] {
        &self.edges[u]
    }

    pub fn is_internal(&self, u: NodeId) -> bool {
        !self.edges[u].is_empty()
    }

    pub fn internal_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.num_nodes()).filter(|&u| self.is_internal(u))
    }

    /// Nodes that own a `base` variable: every internal node, plus the root
    /// even when it has no children (I6 pins `base(root,0)` regardless of
    /// whether the root is structurally "internal"). Ascending order.
    pub fn base_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.internal_nodes().collect();
        if nodes.first() != Some(&0) {
            nodes.insert(0, 0);
        }
        nodes
    }

    /// Largest child label of `u`, or 0 if `u` has no children.
    pub fn max_char(&self, u: NodeId) -> u8 {
        self.edges[u].iter().map(|&(c, _)| c).max().unwrap_or(0)
    }

    /// Sorted child labels of `u`.
    pub fn child_labels(&self, u: NodeId) -> Vec<u8> {
        let mut labels: Vec<u8> = self.edges[u].iter().map(|&(c, _)| c).collect();
        labels.sort_unstable();
        labels
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let file: MatrixFile = serde_json::from_str(&text)?;
        let edges = file
            .mat
            .into_iter()
            .map(|row| row.into_iter().map(|[c, v]| (c as u8, v as usize)).collect())
            .collect();
        Ok(TrieMatrix::new(edges))
    }
}

/// On-disk shape of the trie matrix file: `{"mat": [[[c, v], ...], ...]}`.
#[derive(Debug, Serialize, Deserialize)]
struct MatrixFile {
    mat: Vec<Vec<[u64; 2]>>,
}

/// A decoded double array: `base[u]` and `check[p]`, both of length `N`,
/// either entry absent where the slot is unused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoubleArray {
    pub base: Vec<Option<usize>>,
    pub check: Vec<Option<usize>>,
}

impl DoubleArray {
    pub fn n_arr(&self) -> usize {
        self.base.len()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_char_of_leaf_is_zero() {
        let m = TrieMatrix::new(vec![vec![]]);
        assert_eq!(m.max_char(0), 0);
        assert!(!m.is_internal(0));
    }

    #[test]
    fn max_char_and_labels() {
        let m = TrieMatrix::new(vec![vec![(5, 1), (2, 2)], vec![], vec![]]);
        assert_eq!(m.max_char(0), 5);
        assert_eq!(m.child_labels(0), vec![2, 5]);
        assert!(m.is_internal(0));
        assert_eq!(m.internal_nodes().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn round_trips_double_array_through_json() {
        let da = DoubleArray {
            base: vec![Some(0), None],
            check: vec![None, Some(0)],
        };
        let text = serde_json::to_string(&da).unwrap();
        let back: DoubleArray = serde_json::from_str(&text).unwrap();
        assert_eq!(back.base, da.base);
        assert_eq!(back.check, da.check);
    }
}
