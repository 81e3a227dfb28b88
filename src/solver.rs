//! The solver driver (C4): invoke `varisat` in feasibility or (linear,
//! SAT-only) optimization mode, then decode the model into a [`DoubleArray`].

use crate::cnf::{self, Clause};
use crate::encoder;
use crate::error::{DaError, Result};
use crate::litmgr::{DaKey, DaLiteralManager};
use crate::matrix::{DoubleArray, TrieMatrix};
use log::{debug, info};
use std::collections::HashSet;
use varisat::{ExtendFormula, Lit, Solver};

const ROOT: usize = 0;

fn new_solver(clauses: &[Clause]) -> Solver<'static> {
    let mut solver = Solver::new();
    for clause in clauses {
        let lits: Vec<Lit> = clause.iter().map(|&l| Lit::from_dimacs(l)).collect();
        solver.add_clause(&lits);
    }
    solver
}

fn model_true_ids(model: &[Lit]) -> HashSet<isize> {
    model
        .iter()
        .filter(|l| l.is_positive())
        .map(|l| l.var().to_dimacs() as isize)
        .collect()
}

/// Solve for feasibility only: does a model exist at this `N`?
pub fn solve_feasibility(mat: &TrieMatrix, n_arr: usize) -> Result<DoubleArray> {
    let (lm, clauses) = encoder::encode(mat, n_arr)?;
    info!(
        "feasibility probe: n_arr={n_arr}, n_nodes={}, #vars={}, #clauses={}",
        mat.num_nodes(),
        lm.top(),
        clauses.len()
    );
    let mut solver = new_solver(&clauses);
    let sat = solver.solve().map_err(|e| DaError::ModelExtractionFailed(e.to_string()))?;
    if !sat {
        return Err(DaError::Unsat { n_arr });
    }
    let model = solver
        .model()
        .ok_or_else(|| DaError::ModelExtractionFailed("solver reported SAT with no model".into()))?;
    decode(mat, &lm, &model_true_ids(&model))
}

/// Solve in minimize mode: find a model minimizing the number of used slots.
///
/// `varisat` has no native weighted-MaxSAT entry point, so this runs a
/// linear search on top of plain SAT: after an initial feasible model with
/// `u0` used slots, repeatedly add an at-most-`u-1` bound over the
/// `used(·)` literals and re-solve, keeping the last model before the
/// instance goes UNSAT.
pub fn solve_minimize(mat: &TrieMatrix, n_arr: usize) -> Result<DoubleArray> {
    let (lm, clauses) = encoder::encode(mat, n_arr)?;
    info!(
        "minimize probe: n_arr={n_arr}, n_nodes={}, #vars={}, #clauses={}",
        mat.num_nodes(),
        lm.top(),
        clauses.len()
    );

    let used_vars: Vec<isize> = (0..n_arr)
        .map(|p| lm.get(&DaKey::Used(p)))
        .collect::<Result<_>>()?;

    let mut solver = new_solver(&clauses);
    let sat = solver.solve().map_err(|e| DaError::ModelExtractionFailed(e.to_string()))?;
    if !sat {
        return Err(DaError::Unsat { n_arr });
    }
    let mut best_model = solver
        .model()
        .ok_or_else(|| DaError::ModelExtractionFailed("solver reported SAT with no model".into()))?;
    let mut best_used = count_used_vars(&best_model, &used_vars);
    debug!("initial model uses {best_used} slots");

    // We rebuild a fresh solver each tightening round rather than reusing
    // varisat's incremental interface, since the aux vars introduced by
    // `at_most_k` differ per bound.
    let mut next_aux = lm.top() + 1;
    loop {
        if best_used == 0 {
            break;
        }
        let bound = best_used - 1;
        let mut tightened = clauses.clone();
        let mut alloc = || {
            let id = next_aux;
            next_aux += 1;
            id
        };
        tightened.extend(cnf::at_most_k(&mut alloc, &used_vars, bound));

        let mut solver = new_solver(&tightened);
        let sat = solver
            .solve()
            .map_err(|e| DaError::ModelExtractionFailed(e.to_string()))?;
        if !sat {
            break;
        }
        let model = solver.model().ok_or_else(|| {
            DaError::ModelExtractionFailed("solver reported SAT with no model".into())
        })?;
        let used = count_used_vars(&model, &used_vars);
        debug!("tightened to at most {bound} slots, found model using {used}");
        best_model = model;
        best_used = used;
    }

    decode(mat, &lm, &model_true_ids(&best_model))
}

/// Counts how many of `used_vars` (DIMACS ids for `used(p)`) are true in `model`.
fn count_used_vars(model: &[Lit], used_vars: &[isize]) -> usize {
    let true_ids = model_true_ids(model);
    used_vars.iter().filter(|id| true_ids.contains(id)).count()
}

fn decode(mat: &TrieMatrix, lm: &DaLiteralManager, true_ids: &HashSet<isize>) -> Result<DoubleArray> {
    let n_arr = lm.n_arr();

    let mut nid2base = std::collections::HashMap::new();
    for u in mat.base_nodes() {
        let bound = n_arr - lm.max_char(u) as usize;
        let mut found = None;
        for p in 0..bound {
            let id = lm.get(&DaKey::Base(u, p))?;
            if true_ids.contains(&id) {
                found = Some(p);
                break;
            }
        }
        let p = found.ok_or_else(|| {
            DaError::ModelExtractionFailed(format!("no true base literal for node {u}"))
        })?;
        nid2base.insert(u, p);
    }

    let mut barr: Vec<Option<usize>> = vec![None; n_arr];
    let mut carr: Vec<Option<usize>> = vec![None; n_arr];
    let mut nid2idx = std::collections::HashMap::new();
    nid2idx.insert(ROOT, 0usize);
    barr[0] = nid2base.get(&ROOT).copied();

    for u in mat.internal_nodes() {
        let par_idx = *nid2idx
            .get(&u)
            .ok_or_else(|| DaError::ModelExtractionFailed(format!("node {u} never reached")))?;
        let par_base = nid2base[&u];
        barr[par_idx] = Some(par_base);
        for &(c, child_id) in mat.edges(u) {
            let child_idx = par_base + c as usize;
            if barr[child_idx].is_some() || carr[child_idx].is_some() {
                return Err(DaError::SlotConflict {
                    pos: child_idx,
                    owner: par_idx,
                });
            }
            carr[child_idx] = Some(par_idx);
            nid2idx.insert(child_id, child_idx);
        }
    }

    Ok(DoubleArray { base: barr, check: carr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_root_only_trie() {
        let mat = TrieMatrix::new(vec![vec![]]);
        let da = solve_feasibility(&mat, 1).unwrap();
        assert_eq!(da.base, vec![Some(0)]);
        assert_eq!(da.check, vec![None]);
    }

    #[test]
    fn single_edge() {
        let mat = TrieMatrix::new(vec![vec![(1, 1)], vec![]]);
        let da = solve_feasibility(&mat, 2).unwrap();
        assert_eq!(da.base, vec![Some(0), None]);
        assert_eq!(da.check, vec![None, Some(0)]);
    }

    #[test]
    fn two_siblings() {
        let mat = TrieMatrix::new(vec![vec![(1, 1), (2, 2)], vec![], vec![]]);
        let da = solve_feasibility(&mat, 3).unwrap();
        assert_eq!(da.base[0], Some(0));
        assert_eq!(da.check[1], Some(0));
        assert_eq!(da.check[2], Some(0));
    }

    #[test]
    fn forced_collision_is_unsat() {
        let mat = TrieMatrix::new(vec![vec![(1, 1), (2, 2)], vec![], vec![]]);
        match solve_feasibility(&mat, 2) {
            Err(DaError::Unsat { n_arr: 2 }) => {}
            other => panic!("expected Unsat, got {other:?}"),
        }
    }

    #[test]
    fn chain_of_depth_two() {
        let mat = TrieMatrix::new(vec![vec![(1, 1)], vec![(1, 2)], vec![]]);
        let da = solve_feasibility(&mat, 3).unwrap();
        assert_eq!(da.base[0], Some(0));
        assert_eq!(da.base[1], Some(1));
        assert_eq!(da.check[1], Some(0));
        assert_eq!(da.check[2], Some(1));
    }

    #[test]
    fn minimize_mode_uses_only_root_and_children_slots() {
        let mat = TrieMatrix::new(vec![vec![(1, 1), (3, 2)], vec![], vec![]]);
        let da = solve_minimize(&mat, 5).unwrap();
        let used_count = da.check.iter().filter(|c| c.is_some()).count()
            + da.base.iter().filter(|b| b.is_some()).count();
        // Slots 2 and 4 must be entirely empty; exactly {0,1,3} hold data.
        assert!(da.base[2].is_none() && da.check[2].is_none());
        assert!(da.base[4].is_none() && da.check[4].is_none());
        assert!(used_count > 0);
    }
}
