//! Firing orchestrator
//!
//! Drives one firing cycle at a time:
//!
//! ```text
//! Idle -> FiringRequested -> AwaitingOracle -> Animating -------> Idle
//!                                           \-> ConflictPending -- resolve --^
//! ```
//!
//! The oracle's answer is decomposed into per-arc token legs. Token counts
//! follow a fixed policy:
//! - a place feeding a fired transition over a regular arc shows its new
//!   count as soon as the token departs
//! - a place on a bidirectional arc drops by one immediately (never below
//!   zero) and receives the oracle's count when the token returns
//! - a place fed by a fired transition keeps its old count until the produce
//!   leg crosses its completion threshold
//!
//! The bidirectional double write is deliberate: the place never shows a
//! count the oracle did not confirm once the animation lands, and never an
//! incoherent one while it runs.

use crate::config::{EngineConfig, EngineSettings};
use crate::error::{EngineError, Result};
use crate::notice::{NoticeBoard, ANIMATION_IN_PROGRESS, CONFLICT_PENDING};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use std::time::Duration;
use tokenflow_animation::{
    Clock, Completion, CompletionEvent, FrameSource, SchedulerCommand, TokenAnimator,
};
use tokenflow_core::{ArcKind, Net, NodeId};
use tokenflow_oracle::{NetPayload, Oracle};

/// Orchestrator state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FiringState {
    Idle,
    FiringRequested,
    AwaitingOracle,
    Animating,
    ConflictPending,
}

/// What a firing request led to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FiringOutcome {
    /// Refused because tokens are still moving or a conflict is open
    Rejected,
    /// More than one transition is enabled in deterministic mode
    Conflict(Vec<NodeId>),
    /// Legs were scheduled for the fired transitions
    Animating {
        fired: Vec<NodeId>,
        scheduled: usize,
    },
}

/// Enabled flags saved before an optimistic preview
struct EnablementSnapshot(Vec<(NodeId, bool)>);

impl EnablementSnapshot {
    fn take(net: &Net) -> Self {
        Self(
            net.transitions()
                .map(|t| (t.id.clone(), t.enabled))
                .collect(),
        )
    }

    fn restore(self, net: &mut Net) {
        for (id, enabled) in self.0 {
            if let Some(t) = net.transition_mut(&id) {
                t.enabled = enabled;
            }
        }
    }
}

pub struct FiringOrchestrator<O> {
    oracle: O,
    animator: TokenAnimator,
    notices: NoticeBoard,
    settings: EngineSettings,
    state: FiringState,
    conflicting: Vec<NodeId>,
}

impl<O: Oracle> FiringOrchestrator<O> {
    pub fn new(
        oracle: O,
        clock: Arc<dyn Clock>,
        frames: Arc<dyn FrameSource>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            oracle,
            animator: TokenAnimator::new(clock.clone(), frames, config.timing, config.path),
            notices: NoticeBoard::new(clock, config.engine.notice_ttl()),
            settings: config.engine.clone(),
            state: FiringState::Idle,
            conflicting: Vec::new(),
        }
    }

    pub fn state(&self) -> FiringState {
        self.state
    }

    /// Transitions awaiting a user decision
    pub fn conflicting_transitions(&self) -> &[NodeId] {
        &self.conflicting
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_deterministic_mode(&mut self, deterministic: bool) {
        self.settings.deterministic_mode = deterministic;
    }

    pub fn animator(&self) -> &TokenAnimator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut TokenAnimator {
        &mut self.animator
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn has_active_animations(&self) -> bool {
        self.animator.has_active_animations()
    }

    /// Visible transient notices
    pub fn notices(&mut self) -> Vec<String> {
        self.notices.active()
    }

    /// Fire the net once
    ///
    /// Refused with a notice while animations are running or a conflict is
    /// open. On oracle failure nothing in `net` changes.
    pub async fn fire(&mut self, net: &mut Net) -> Result<FiringOutcome> {
        let resting = self.state;
        self.set_state(FiringState::FiringRequested);

        if self.animator.has_active_animations() {
            tracing::warn!("firing rejected: animation in progress");
            self.notices.push(ANIMATION_IN_PROGRESS);
            self.set_state(resting);
            return Ok(FiringOutcome::Rejected);
        }
        if resting == FiringState::ConflictPending {
            tracing::warn!("firing rejected: conflict pending");
            self.notices.push(CONFLICT_PENDING);
            self.set_state(resting);
            return Ok(FiringOutcome::Rejected);
        }

        let request = self.payload(net);
        self.set_state(FiringState::AwaitingOracle);
        let response = match self.oracle.process(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("firing aborted: {}", e);
                self.set_state(FiringState::Idle);
                return Err(e.into());
            }
        };

        Ok(self.apply_response(net, response))
    }

    /// Fire `transition` to settle the pending conflict
    ///
    /// The choice is previewed on the net's enabled flags while the oracle
    /// answers and reverted if the call fails.
    pub async fn resolve(&mut self, net: &mut Net, transition: &NodeId) -> Result<FiringOutcome> {
        if self.state != FiringState::ConflictPending {
            return Err(EngineError::NoConflict);
        }
        if !self.conflicting.contains(transition) {
            return Err(EngineError::NotInConflict(transition.clone()));
        }

        self.set_state(FiringState::FiringRequested);
        let request = self.payload(net).with_selected_transition(transition.clone());

        let snapshot = EnablementSnapshot::take(net);
        for t in net.transitions_mut() {
            t.enabled = &t.id == transition;
        }

        self.set_state(FiringState::AwaitingOracle);
        let response = match self.oracle.resolve(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("conflict resolution aborted: {}", e);
                snapshot.restore(net);
                self.set_state(FiringState::ConflictPending);
                return Err(e.into());
            }
        };

        Ok(self.apply_response(net, response))
    }

    /// Host frame callback; applies completed token commits to `net`
    ///
    /// Returns the tags of any `Completion::Signal`s that fired.
    pub fn on_frame(&mut self, net: &mut Net) -> Vec<u64> {
        let events = self.animator.on_frame();
        apply_completions(net, events)
    }

    /// Jump all animations to their end and apply their commits
    pub fn skip(&mut self, net: &mut Net) -> Vec<u64> {
        let events = self.animator.complete_current_animations();
        apply_completions(net, events)
    }

    /// Drop animations and any pending conflict
    pub fn reset(&mut self) {
        self.animator.clear();
        self.conflicting.clear();
        self.set_state(FiringState::Idle);
    }

    fn set_state(&mut self, next: FiringState) {
        if self.state != next {
            tracing::debug!("firing state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn payload(&self, net: &Net) -> NetPayload {
        NetPayload::from_net(net)
            .with_deterministic_mode(self.settings.deterministic_mode)
            .with_title(self.settings.title.clone())
    }

    fn apply_response(&mut self, net: &mut Net, response: NetPayload) -> FiringOutcome {
        let flags = response.enabled_flags();
        let fired: Vec<NodeId> = net
            .transitions()
            .filter(|t| flags.get(&t.id).copied().unwrap_or(false))
            .map(|t| t.id.clone())
            .collect();

        for t in net.transitions_mut() {
            if let Some(&enabled) = flags.get(&t.id) {
                t.enabled = enabled;
            }
        }

        if self.settings.deterministic_mode && fired.len() > 1 {
            tracing::info!("conflict between {} transitions: {:?}", fired.len(), fired);
            self.animator.clear();
            self.conflicting = fired.clone();
            self.set_state(FiringState::ConflictPending);
            return FiringOutcome::Conflict(fired);
        }

        self.conflicting.clear();
        self.set_state(FiringState::Animating);
        let scheduled = self.schedule_firings(net, &fired, &response.marking());
        tracing::info!(
            "fired {} transitions, {} token legs scheduled",
            fired.len(),
            scheduled
        );

        // Ready for the next request without waiting for the tokens to land
        self.set_state(FiringState::Idle);
        FiringOutcome::Animating { fired, scheduled }
    }

    /// Schedule legs for every fired transition and apply immediate counts
    fn schedule_firings(
        &mut self,
        net: &mut Net,
        fired: &[NodeId],
        marking: &FxHashMap<NodeId, u32>,
    ) -> usize {
        let now = self.animator.now();
        let delay = self.animator.timing().produce_delay();
        let mut commands = Vec::new();
        let mut scheduled = 0;
        let mut animated: FxHashSet<NodeId> = FxHashSet::default();

        for transition in fired {
            let arcs: Vec<_> = net.arcs_of(transition).cloned().collect();

            // Consumption first; production starts once the slowest input lands.
            let mut consume_time = Duration::ZERO;
            for arc in arcs
                .iter()
                .filter(|a| a.kind == ArcKind::Regular && &a.target == transition)
            {
                let place = &arc.source;
                let Some(leg) = self.animator.plan_leg(net, place, transition, arc) else {
                    continue;
                };
                consume_time = consume_time.max(leg.duration);
                commands.push(SchedulerCommand::ScheduleConsume {
                    request: leg.into_request(now),
                    on_complete: None,
                });
                if let Some(&tokens) = marking.get(place) {
                    net.set_tokens(place, tokens);
                }
                animated.insert(place.clone());
            }

            let produce_at = if consume_time.is_zero() {
                now
            } else {
                now + consume_time + delay
            };
            for arc in arcs
                .iter()
                .filter(|a| a.kind == ArcKind::Regular && &a.source == transition)
            {
                let place = &arc.target;
                let Some(leg) = self.animator.plan_leg(net, transition, place, arc) else {
                    continue;
                };
                commands.push(SchedulerCommand::ScheduleProduce {
                    request: leg.into_request(produce_at),
                    on_complete: marking.get(place).map(|&tokens| Completion::CommitTokens {
                        place: place.clone(),
                        tokens,
                    }),
                });
                animated.insert(place.clone());
            }

            for arc in arcs.iter().filter(|a| a.kind == ArcKind::Bidirectional) {
                let Some(place) = arc.other_end(transition) else {
                    continue;
                };
                let Some(prior) = net.tokens(place) else {
                    tracing::debug!("skipping arc {}: place {} is gone", arc.id, place);
                    continue;
                };
                let restore = Completion::CommitTokens {
                    place: place.clone(),
                    tokens: marking.get(place).copied().unwrap_or(prior),
                };
                if self
                    .animator
                    .start_round_trip(net, place, transition, arc, None, Some(restore))
                    .is_none()
                {
                    continue;
                }
                scheduled += 2;
                net.set_tokens(place, prior.saturating_sub(1));
                animated.insert(place.clone());
            }
        }

        // Counts the oracle changed without any leg to carry them
        for (place, &tokens) in marking {
            if animated.contains(place) {
                continue;
            }
            if net.tokens(place).is_some_and(|current| current != tokens) {
                tracing::debug!("committing {} = {} without animation", place, tokens);
                net.set_tokens(place, tokens);
            }
        }

        scheduled += commands.len();
        for command in commands {
            self.animator.submit(command);
        }
        scheduled
    }
}

fn apply_completions(net: &mut Net, events: Vec<CompletionEvent>) -> Vec<u64> {
    let mut signals = Vec::new();
    for event in events {
        match event.completion {
            Completion::CommitTokens { place, tokens } => net.set_tokens(&place, tokens),
            Completion::Signal(tag) => signals.push(tag),
        }
    }
    signals
}
