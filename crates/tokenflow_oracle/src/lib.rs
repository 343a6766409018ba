//! Tokenflow Oracle
//!
//! The firing oracle is an external service that evaluates enablement and
//! computes the next marking. This crate provides:
//!
//! - [`NetPayload`] - the JSON page format sent and received
//! - [`Oracle`] - the async port the engine depends on
//! - [`HttpOracle`] - the HTTP implementation (`POST .../page/{id}/process|resolve`)

mod client;
mod error;
mod wire;

pub use client::{HttpOracle, Oracle, OracleConfig};
pub use error::{OracleError, Result};
pub use wire::{ArcDto, NetPayload, PlaceDto, TransitionDto};
