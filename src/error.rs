//! Error types shared by the literal manager, encoder, solver and search driver.

use thiserror::Error;

/// Errors produced while building or solving a double-array layout.
#[derive(Error, Debug)]
pub enum DaError {
    /// The caller tried to allocate a key that already has an id, or look up
    /// one that was never allocated. Always a programming error.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// `N` is too small to even hold one node's children, or zero.
    #[error("invalid array size {n_arr}: {reason}")]
    InvalidBound { n_arr: usize, reason: String },

    /// The solver proved the instance has no model at this `N`.
    #[error("unsatisfiable at N={n_arr}")]
    Unsat { n_arr: usize },

    /// The solver did not finish within the wall-clock budget.
    #[error("timed out after {elapsed:?} at N={n_arr}")]
    Timeout {
        n_arr: usize,
        elapsed: std::time::Duration,
    },

    /// A literal the decoder expected true was absent from the model.
    #[error("model extraction failed: {0}")]
    ModelExtractionFailed(String),

    /// Decoding discovered two nodes claiming the same array slot. Indicates
    /// an encoder bug, since the CNF should make this impossible.
    #[error("slot conflict at position {pos}: already owned by node {owner}")]
    SlotConflict { pos: usize, owner: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DaError>;
