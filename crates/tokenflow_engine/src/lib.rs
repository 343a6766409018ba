//! Tokenflow Engine
//!
//! Glue between the firing oracle and the token animator. A firing cycle
//! sends the current net to the oracle, reads back which transitions fired
//! and the new marking, and turns that into scheduled token flows whose
//! completions write the new counts into the net.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokenflow_animation::{FrameSignal, SystemClock};
//! use tokenflow_engine::{EngineConfig, FiringOrchestrator};
//! use tokenflow_oracle::HttpOracle;
//!
//! let config = EngineConfig::default();
//! let frames = FrameSignal::new();
//! let oracle = HttpOracle::new(config.oracle.clone())?;
//! let mut engine = FiringOrchestrator::new(
//!     oracle,
//!     Arc::new(SystemClock::new()),
//!     Arc::new(frames.clone()),
//!     &config,
//! );
//!
//! engine.fire(&mut net).await?;
//! while frames.take() {
//!     engine.on_frame(&mut net);
//! }
//! ```

pub mod config;
pub mod error;
pub mod notice;
pub mod orchestrator;

pub use config::{EngineConfig, EngineSettings};
pub use error::{EngineError, Result};
pub use notice::{Notice, NoticeBoard, ANIMATION_IN_PROGRESS, CONFLICT_PENDING};
pub use orchestrator::{FiringOrchestrator, FiringOutcome, FiringState};
