//! Tokenflow Animation System
//!
//! Turns an instantaneous firing into tokens travelling along arcs.
//!
//! # Features
//!
//! - **Arena Scheduler**: every in-flight token is a record addressed by an `AnimationId`
//! - **Injected Time**: a [`Clock`] and a [`FrameSource`] stand in for the host's frame loop
//! - **Scheduled Causality**: production starts after consumption by start time, not by blocking
//! - **Data Completions**: completion callbacks are [`Completion`] values handed back per tick
//! - **Token Animator**: consume/produce and bidirectional pairs built from net geometry

pub mod animator;
pub mod clock;
pub mod easing;
pub mod frame;
pub mod scheduler;
pub mod timing;

pub use animator::{FlowPair, Leg, TokenAnimator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use easing::Easing;
pub use frame::{FrameSignal, FrameSource};
pub use scheduler::{
    AnimationId, AnimationKind, AnimationRecord, AnimationRequest, AnimationScheduler,
    Completion, CompletionEvent, SchedulerCommand,
};
pub use timing::TimingConfig;
