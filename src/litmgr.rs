//! Keyed literal allocation: a bijection between structured identifiers and
//! the positive integer variable ids a SAT solver understands.

use crate::error::{DaError, Result};
use crate::matrix::{NodeId, TrieMatrix};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A structured variable identifier. Any closed, hashable key type the
/// encoder wants to allocate against.
pub trait Key: Eq + Hash + Clone + Debug {
    /// Build the key for the `idx`-th anonymous (Tseitin) auxiliary variable.
    fn aux(idx: u64) -> Self;
}

/// Generic bijection between keys and 1-based DIMACS variable ids.
#[derive(Debug)]
pub struct LiteralManager<K: Key> {
    key_to_id: HashMap<K, isize>,
    id_to_key: Vec<K>, // id_to_key[id - 1] == key for id
    aux_count: u64,
}

impl<K: Key> LiteralManager<K> {
    pub fn new() -> Self {
        LiteralManager {
            key_to_id: HashMap::new(),
            id_to_key: Vec::new(),
            aux_count: 0,
        }
    }

    /// Allocate a fresh id for `key`. Fails if `key` is already bound.
    pub fn new_id(&mut self, key: K) -> Result<isize> {
        if self.key_to_id.contains_key(&key) {
            return Err(DaError::InvalidKey(format!("duplicate key {key:?}")));
        }
        let id = (self.id_to_key.len() + 1) as isize;
        self.key_to_id.insert(key.clone(), id);
        self.id_to_key.push(key);
        Ok(id)
    }

    /// Allocate a fresh anonymous auxiliary variable.
    pub fn new_aux(&mut self) -> isize {
        let key = K::aux(self.aux_count);
        self.aux_count += 1;
        // Aux keys are unique by construction, so this cannot fail.
        self.new_id(key).expect("aux keys are never reused")
    }

    pub fn get(&self, key: &K) -> Result<isize> {
        self.key_to_id
            .get(key)
            .copied()
            .ok_or_else(|| DaError::InvalidKey(format!("unbound key {key:?}")))
    }

    pub fn has(&self, key: &K) -> bool {
        self.key_to_id.contains_key(key)
    }

    pub fn id_to_key(&self, id: isize) -> Result<&K> {
        let idx = id.unsigned_abs() as usize;
        self.id_to_key
            .get(idx - 1)
            .ok_or_else(|| DaError::InvalidKey(format!("unbound id {id}")))
    }

    /// The largest id allocated so far.
    pub fn top(&self) -> isize {
        self.id_to_key.len() as isize
    }
}

impl<K: Key> Default for LiteralManager<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Category tag mirroring the closed enumeration `{true, false, aux, base,
/// check, used}` the double-array encoding is built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DaKey {
    True,
    False,
    Aux(u64),
    /// node `u`'s base is `p`.
    Base(NodeId, usize),
    /// slot `p` is owned by (has a parent pointer for) node `u`.
    Check(NodeId, usize),
    /// slot `p` is occupied.
    Used(usize),
}

impl Key for DaKey {
    fn aux(idx: u64) -> Self {
        DaKey::Aux(idx)
    }
}

/// The DA-specialized literal manager: validates each key's array-size and
/// node bounds, and pre-allocates every `base(u,p)` key at construction, per
/// the encoder's deterministic allocation order.
pub struct DaLiteralManager {
    inner: LiteralManager<DaKey>,
    n_nodes: usize,
    n_arr: usize,
    max_char: Vec<u8>,
}

impl DaLiteralManager {
    pub fn new(mat: &TrieMatrix, n_arr: usize) -> Result<Self> {
        if n_arr == 0 {
            return Err(DaError::InvalidBound {
                n_arr,
                reason: "array size must be positive".into(),
            });
        }
        let n_nodes = mat.num_nodes();
        let max_char: Vec<u8> = (0..n_nodes).map(|u| mat.max_char(u)).collect();

        for u in mat.base_nodes() {
            if n_arr <= max_char[u] as usize {
                return Err(DaError::InvalidBound {
                    n_arr,
                    reason: format!("node {u} has max child label {}", max_char[u]),
                });
            }
        }

        let mut mgr = DaLiteralManager {
            inner: LiteralManager::new(),
            n_nodes,
            n_arr,
            max_char,
        };
        for key in mgr.base_keys(mat) {
            mgr.inner.new_id(key)?;
        }
        Ok(mgr)
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn n_arr(&self) -> usize {
        self.n_arr
    }

    pub fn max_char(&self, u: NodeId) -> u8 {
        self.max_char[u]
    }

    /// `base(u,p)` keys for every node that owns a base variable, in
    /// node-then-position order — the deterministic allocation order the
    /// encoder relies on.
    pub fn base_keys(&self, mat: &TrieMatrix) -> Vec<DaKey> {
        mat.base_nodes()
            .into_iter()
            .flat_map(|u| {
                let bound = self.n_arr - self.max_char[u] as usize;
                (0..bound).map(move |p| DaKey::Base(u, p))
            })
            .collect()
    }

    pub fn base_vars(&self, mat: &TrieMatrix, u: NodeId) -> Result<Vec<isize>> {
        let bound = self.n_arr - self.max_char[u] as usize;
        (0..bound).map(|p| self.get(&DaKey::Base(u, p))).collect()
    }

    pub fn new_id(&mut self, key: DaKey) -> Result<isize> {
        self.validate(&key)?;
        self.inner.new_id(key)
    }

    pub fn new_aux(&mut self) -> isize {
        self.inner.new_aux()
    }

    pub fn get(&self, key: &DaKey) -> Result<isize> {
        self.inner.get(key)
    }

    pub fn has(&self, key: &DaKey) -> bool {
        self.inner.has(key)
    }

    pub fn id_to_key(&self, id: isize) -> Result<&DaKey> {
        self.inner.id_to_key(id)
    }

    pub fn top(&self) -> isize {
        self.inner.top()
    }

    fn validate(&self, key: &DaKey) -> Result<()> {
        match *key {
            DaKey::Base(u, p) => {
                if u >= self.n_nodes || p >= self.n_arr - self.max_char[u] as usize {
                    return Err(DaError::InvalidKey(format!(
                        "base({u},{p}) out of bounds for n_arr={}",
                        self.n_arr
                    )));
                }
            }
            DaKey::Check(u, p) => {
                if u >= self.n_nodes || p >= self.n_arr {
                    return Err(DaError::InvalidKey(format!("check({u},{p}) out of bounds")));
                }
            }
            DaKey::Used(p) => {
                if p >= self.n_arr {
                    return Err(DaError::InvalidKey(format!("used({p}) out of bounds")));
                }
            }
            DaKey::True | DaKey::False | DaKey::Aux(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_size() {
        let mat = TrieMatrix::new(vec![vec![]]);
        assert!(DaLiteralManager::new(&mat, 0).is_err());
    }

    #[test]
    fn rejects_n_too_small_for_max_char() {
        let mat = TrieMatrix::new(vec![vec![(5, 1)], vec![]]);
        assert!(DaLiteralManager::new(&mat, 5).is_err());
        assert!(DaLiteralManager::new(&mat, 6).is_ok());
    }

    #[test]
    fn base_keys_preregistered_in_node_then_position_order() {
        let mat = TrieMatrix::new(vec![vec![(1, 1)], vec![]]);
        let mgr = DaLiteralManager::new(&mat, 3).unwrap();
        // n_arr(3) - max_char(0)(1) = 2 positions for node 0.
        assert!(mgr.has(&DaKey::Base(0, 0)));
        assert!(mgr.has(&DaKey::Base(0, 1)));
        assert!(!mgr.has(&DaKey::Base(0, 2)));
        assert_eq!(mgr.get(&DaKey::Base(0, 0)).unwrap(), 1);
        assert_eq!(mgr.get(&DaKey::Base(0, 1)).unwrap(), 2);
    }

    #[test]
    fn duplicate_allocation_fails() {
        let mat = TrieMatrix::new(vec![vec![]]);
        let mut mgr = DaLiteralManager::new(&mat, 1).unwrap();
        mgr.new_id(DaKey::Used(0)).unwrap();
        assert!(mgr.new_id(DaKey::Used(0)).is_err());
    }

    #[test]
    fn aux_ids_never_collide_with_structured_ones() {
        let mat = TrieMatrix::new(vec![vec![(1, 1)], vec![]]);
        let mut mgr = DaLiteralManager::new(&mat, 3).unwrap();
        let a = mgr.new_aux();
        let b = mgr.new_aux();
        assert_ne!(a, b);
        assert!(a > mgr.get(&DaKey::Base(0, 1)).unwrap());
    }
}
