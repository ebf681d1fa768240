//! Error taxonomy shared across the Farad crates.

use thiserror::Error;

/// Errors surfaced by circuit mutation, assembly, and solving.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter is out of range or inconsistent (negative step, zero
    /// increment, sweep direction mismatch, non-positive inductance,
    /// missing referenced branch, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An element with the same name already exists in the circuit.
    #[error("element '{0}' already exists")]
    DuplicateName(String),

    /// A named element or node does not exist.
    #[error("'{0}' not found")]
    NotFound(String),

    /// A rename target already exists.
    #[error("'{0}' already exists")]
    Conflict(String),

    /// An analysis was requested on a circuit with no designated ground.
    #[error("no ground node designated")]
    MissingGround,

    /// The pre-analysis connectivity check failed.
    #[error("circuit is not fully connected")]
    Disconnected,

    /// A linear solve hit a pivot below the singularity floor.
    #[error("matrix is singular")]
    Singular,

    /// Matrix and right-hand side dimensions disagree.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
