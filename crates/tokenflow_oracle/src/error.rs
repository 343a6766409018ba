//! Oracle error types

use thiserror::Error;

/// Errors talking to the firing oracle
#[derive(Error, Debug)]
pub enum OracleError {
    /// Request could not be sent or no response arrived
    #[error("Oracle unreachable: {0}")]
    Network(String),

    /// Oracle answered with a non-success status
    #[error("Oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a valid net payload
    #[error("Failed to decode oracle response: {0}")]
    Decode(String),

    /// Configured endpoint is not a usable URL
    #[error("Invalid oracle endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Result type for oracle operations
pub type Result<T> = std::result::Result<T, OracleError>;
