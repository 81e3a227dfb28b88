//! The DA encoder: turns a trie matrix and a candidate array size into a
//! populated literal manager plus the CNF clauses enforcing a valid
//! double-array layout at that size.

use crate::cnf::{self, Clause};
use crate::error::Result;
use crate::litmgr::{DaKey, DaLiteralManager};
use crate::matrix::TrieMatrix;

const ROOT: usize = 0;

/// Builds the literal manager and clause set for one `(matrix, n_arr)` probe.
pub fn encode(mat: &TrieMatrix, n_arr: usize) -> Result<(DaLiteralManager, Vec<Clause>)> {
    let mut lm = DaLiteralManager::new(mat, n_arr)?;
    let mut clauses = Vec::new();

    // Allocation order: base(u,p) was pre-registered by DaLiteralManager::new.
    // check(u,p) next, in node-major order.
    for u in 0..mat.num_nodes() {
        for p in 0..n_arr {
            lm.new_id(DaKey::Check(u, p))?;
        }
    }
    // then used(p).
    for p in 0..n_arr {
        lm.new_id(DaKey::Used(p))?;
    }

    // (E1) base-to-check propagation: base(u,p) => check(u, p+c) for every
    // edge (c,v) of u. check is parent-indexed: the parent's node id, not
    // the child's.
    for u in mat.internal_nodes() {
        let bound = n_arr - lm.max_char(u) as usize;
        for p in 0..bound {
            let base_lit = lm.get(&DaKey::Base(u, p))?;
            for &(c, _v) in mat.edges(u) {
                let check_lit = lm.get(&DaKey::Check(u, p + c as usize))?;
                clauses.push(cnf::imply(base_lit, check_lit));
            }
        }
    }

    // (E2) exactly-one base per node that owns one (every internal node,
    // plus the root even when childless — see TrieMatrix::base_nodes).
    for u in mat.base_nodes() {
        let xs = lm.base_vars(mat, u)?;
        let mut alloc = || lm.new_aux();
        let (z, eo_clauses) = cnf::exactly_one(&mut alloc, &xs);
        clauses.extend(eo_clauses);
        clauses.push(vec![z]);
    }

    // (E3) per-slot uniqueness: at most one check(u,p) true, for each p.
    for p in 0..n_arr {
        let xs: Vec<isize> = (0..mat.num_nodes())
            .map(|u| lm.get(&DaKey::Check(u, p)))
            .collect::<Result<_>>()?;
        let mut alloc = || lm.new_aux();
        clauses.extend(cnf::at_most_one(&mut alloc, &xs));
    }

    // (E4) used-definition: check(u,p) => used(p).
    for u in 0..mat.num_nodes() {
        for p in 0..n_arr {
            let check_lit = lm.get(&DaKey::Check(u, p))?;
            let used_lit = lm.get(&DaKey::Used(p))?;
            clauses.push(cnf::imply(check_lit, used_lit));
        }
    }

    // (E5) used-monotonicity: used(p) => used(p-1).
    for p in 1..n_arr {
        let used_p = lm.get(&DaKey::Used(p))?;
        let used_p_minus_1 = lm.get(&DaKey::Used(p - 1))?;
        clauses.push(cnf::imply(used_p, used_p_minus_1));
    }

    // (E6) root anchoring.
    let root_base0 = lm.get(&DaKey::Base(ROOT, 0))?;
    clauses.push(vec![root_base0]);

    Ok((lm, clauses))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_array_too_small_for_children() {
        let mat = TrieMatrix::new(vec![vec![(1, 1), (2, 2)], vec![], vec![]]);
        assert!(encode(&mat, 2).is_err());
    }

    #[test]
    fn root_only_trie_has_a_unit_clause_for_base_zero() {
        let mat = TrieMatrix::new(vec![vec![]]);
        let (lm, clauses) = encode(&mat, 1).unwrap();
        let root_base0 = lm.get(&DaKey::Base(0, 0)).unwrap();
        assert!(clauses.contains(&vec![root_base0]));
    }

    #[test]
    fn single_edge_propagates_base_to_check() {
        let mat = TrieMatrix::new(vec![vec![(1, 1)], vec![]]);
        let (lm, clauses) = encode(&mat, 2).unwrap();
        let base00 = lm.get(&DaKey::Base(0, 0)).unwrap();
        let check01 = lm.get(&DaKey::Check(0, 1)).unwrap();
        assert!(clauses.contains(&cnf::imply(base00, check01)));
    }
}
