//! The size search (C5): a bracketed binary search over `N`, probing several
//! candidate sizes in parallel (via `rayon`) with a per-probe wall-clock
//! timeout.

use crate::matrix::{DoubleArray, TrieMatrix};
use crate::solver;
use log::info;
use rayon::prelude::*;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Outcome of one probe at a specific `N`.
enum ProbeOutcome {
    Success(DoubleArray),
    Failure,
}

/// Runs `solve_feasibility` on its own thread, racing it against `timeout`.
/// A probe that overruns is reported as a failure; its thread is left to run
/// to completion in the background. Rust has no safe API to forcibly kill a
/// running thread, so this is a timeout on *waiting*, not a true abort.
fn probe(mat: &TrieMatrix, n_arr: usize, timeout: Duration) -> ProbeOutcome {
    let (tx, rx) = mpsc::channel();
    let mat = mat.clone();
    std::thread::spawn(move || {
        let result = solver::solve_feasibility(&mat, n_arr);
        // The receiver may already be gone if we timed out; ignore that.
        let _ = tx.send(result);
    });

    let started = Instant::now();
    match rx.recv_timeout(timeout) {
        Ok(Ok(da)) => ProbeOutcome::Success(da),
        Ok(Err(_)) => ProbeOutcome::Failure,
        Err(_) => {
            info!(
                "probe N={n_arr} timed out after {:?} (budget {timeout:?})",
                started.elapsed()
            );
            ProbeOutcome::Failure
        }
    }
}

/// A default, always-feasible upper bound used when the caller doesn't
/// supply `--size-end`: lay every internal node's children out back to
/// back, one node after another. Trivially feasible but typically much
/// larger than the true minimum; a real layout tool would seed the search
/// with a packed greedy placement instead.
pub fn default_upper_bound(mat: &TrieMatrix) -> usize {
    mat.internal_nodes()
        .map(|u| mat.max_char(u) as usize + 1)
        .sum::<usize>()
        .max(1)
}

/// Result of a full size search.
pub struct SearchResult {
    pub n_arr: usize,
    pub model: DoubleArray,
}

/// Bracketed binary search with parallel multi-point probing. `lo`/`hi` form
/// the initial `(bad, good)` bracket as `bad = lo - 1`, `good = hi`; `hi`
/// itself must be feasible (callers relying on [`default_upper_bound`] get
/// this for free).
pub fn search(
    mat: &TrieMatrix,
    lo: usize,
    hi: usize,
    timeout: Duration,
    n_proc: usize,
) -> Option<SearchResult> {
    let workers = n_proc.max(1);
    let mut bad = lo.saturating_sub(1);
    let mut good = hi;
    let mut best_model: Option<DoubleArray> = None;

    // Establish that `good` itself is feasible before entering the loop,
    // since the loop only ever narrows the bracket assuming that invariant.
    match probe(mat, good, timeout) {
        ProbeOutcome::Success(da) => best_model = Some(da),
        ProbeOutcome::Failure => {
            info!("initial upper bound N={good} is infeasible or timed out; search aborted");
            return None;
        }
    }

    while good > bad + 1 {
        let step = ((good - bad) / (workers + 1)).max(1);
        let mut sizes: Vec<usize> = Vec::new();
        for i in 1..=workers {
            let y = bad + i * step;
            if y > bad && y < good && !sizes.contains(&y) {
                sizes.push(y);
            }
        }
        if sizes.is_empty() {
            break;
        }
        info!("probing sizes {sizes:?} in bracket ({bad}, {good})");

        let mut results: Vec<(usize, ProbeOutcome)> = sizes
            .par_iter()
            .map(|&size| (size, probe(mat, size, timeout)))
            .collect();
        results.sort_by_key(|(size, _)| *size);

        let first_success = results.iter().position(|(_, r)| matches!(r, ProbeOutcome::Success(_)));
        match first_success {
            None => {
                bad = *sizes.iter().max().unwrap();
            }
            Some(i) => {
                if i > 0 {
                    bad = results[i - 1].0;
                }
                good = results[i].0;
                if let (_, ProbeOutcome::Success(da)) = results.swap_remove(i) {
                    best_model = Some(da);
                }
            }
        }
    }

    best_model.map(|model| SearchResult { n_arr: good, model })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_upper_bound_is_always_feasible() {
        let mat = TrieMatrix::new(vec![vec![(1, 1), (2, 2)], vec![], vec![]]);
        let hi = default_upper_bound(&mat);
        assert!(solver::solve_feasibility(&mat, hi).is_ok());
    }

    #[test]
    fn search_finds_minimum_feasible_size_for_two_siblings() {
        let mat = TrieMatrix::new(vec![vec![(1, 1), (2, 2)], vec![], vec![]]);
        let hi = default_upper_bound(&mat);
        let result = search(&mat, 1, hi, Duration::from_secs(10), 2).unwrap();
        assert_eq!(result.n_arr, 3);
    }

    #[test]
    fn search_on_root_only_trie() {
        let mat = TrieMatrix::new(vec![vec![]]);
        let result = search(&mat, 1, 1, Duration::from_secs(10), 1).unwrap();
        assert_eq!(result.n_arr, 1);
        assert_eq!(result.model.base, vec![Some(0)]);
    }
}
