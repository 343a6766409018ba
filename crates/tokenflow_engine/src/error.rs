//! Engine error types

use thiserror::Error;
use tokenflow_core::NodeId;
use tokenflow_oracle::OracleError;

/// Errors from a firing cycle
#[derive(Error, Debug)]
pub enum EngineError {
    /// The oracle call failed; nothing was applied
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// `resolve` was called without a pending conflict
    #[error("No conflict is pending")]
    NoConflict,

    /// The chosen transition is not one of the conflicting ones
    #[error("Transition {0} is not part of the pending conflict")]
    NotInConflict(NodeId),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
