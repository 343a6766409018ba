//! Token animator
//!
//! The programmatic surface the editor talks to. Resolves arcs to paths and
//! durations against the current net, then feeds the scheduler. Production
//! is ordered after consumption purely by start time: the produce leg begins
//! when the consume leg ends, plus a short delay.

use crate::clock::Clock;
use crate::frame::FrameSource;
use crate::scheduler::{
    AnimationId, AnimationKind, AnimationRecord, AnimationRequest, AnimationScheduler,
    Completion, CompletionEvent, SchedulerCommand,
};
use crate::timing::TimingConfig;
use std::sync::Arc;
use std::time::Duration;
use tokenflow_core::{build_path, Arc as NetArc, ArcId, ArcKind, FlowPath, Net, NodeId, PathStyle};

/// One arc traversal, resolved but not yet scheduled
#[derive(Clone, Debug)]
pub struct Leg {
    pub arc: ArcId,
    pub source: NodeId,
    pub target: NodeId,
    pub path: FlowPath,
    pub duration: Duration,
}

impl Leg {
    pub fn into_request(self, start_at: Duration) -> AnimationRequest {
        AnimationRequest {
            source: self.source,
            target: self.target,
            path: self.path,
            start_at,
            duration: self.duration,
        }
    }
}

/// Ids of a consume leg and the produce leg that follows it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowPair {
    pub consume: AnimationId,
    pub produce: AnimationId,
}

pub struct TokenAnimator {
    scheduler: AnimationScheduler,
    style: PathStyle,
}

impl TokenAnimator {
    pub fn new(
        clock: Arc<dyn Clock>,
        frames: Arc<dyn FrameSource>,
        timing: TimingConfig,
        style: PathStyle,
    ) -> Self {
        Self {
            scheduler: AnimationScheduler::new(clock, frames, timing),
            style,
        }
    }

    pub fn timing(&self) -> &TimingConfig {
        self.scheduler.timing()
    }

    pub fn style(&self) -> &PathStyle {
        &self.style
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Resolve the path and duration of `arc` travelled from `from` to `to`
    ///
    /// Returns `None` when either node no longer exists.
    pub fn plan_leg(&self, net: &Net, from: &NodeId, to: &NodeId, arc: &NetArc) -> Option<Leg> {
        let (Some(source), Some(target)) = (net.element(from), net.element(to)) else {
            tracing::debug!("skipping arc {}: endpoint {} or {} is gone", arc.id, from, to);
            return None;
        };

        let path = build_path(&source, &target, arc, net.arcs(), &self.style);
        let duration = self.timing().duration_for(path.length());
        Some(Leg {
            arc: arc.id.clone(),
            source: from.clone(),
            target: to.clone(),
            path,
            duration,
        })
    }

    /// Schedule a resolved leg at `start_at`
    pub fn schedule(
        &mut self,
        kind: AnimationKind,
        leg: Leg,
        start_at: Duration,
        on_complete: Option<Completion>,
    ) -> AnimationId {
        self.scheduler.schedule(kind, leg.into_request(start_at), on_complete)
    }

    pub fn submit(&mut self, command: SchedulerCommand) -> Option<AnimationId> {
        self.scheduler.submit(command)
    }

    /// Token flow `source` place -> `transition` -> `target` place
    ///
    /// `on_complete` is attached to the produce leg. Returns `None` without
    /// scheduling anything when an arc or node is missing.
    pub fn start_animation(
        &mut self,
        net: &Net,
        source: &NodeId,
        target: &NodeId,
        transition: &NodeId,
        on_complete: Option<Completion>,
    ) -> Option<FlowPair> {
        let consume_arc = find_arc(net, source, transition, ArcKind::Regular)?;
        let produce_arc = find_arc(net, transition, target, ArcKind::Regular)?;
        let consume = self.plan_leg(net, source, transition, consume_arc)?;
        let produce = self.plan_leg(net, transition, target, produce_arc)?;
        Some(self.schedule_pair(consume, produce, None, on_complete))
    }

    /// Token leaves `place` for `transition` and is restored afterwards
    ///
    /// Used for bidirectional arcs. The caller decrements the displayed count
    /// when the flow starts; `on_restore_complete` carries the authoritative
    /// count back.
    pub fn start_bidirectional_animation(
        &mut self,
        net: &Net,
        place: &NodeId,
        transition: &NodeId,
        on_consume_complete: Option<Completion>,
        on_restore_complete: Option<Completion>,
    ) -> Option<FlowPair> {
        let arc = net.arcs().iter().find(|a| {
            a.kind == ArcKind::Bidirectional && a.touches(place) && a.touches(transition)
        })?;
        self.start_round_trip(
            net,
            place,
            transition,
            arc,
            on_consume_complete,
            on_restore_complete,
        )
    }

    /// Out-and-back flow over one given `arc`
    ///
    /// Both legs share the arc's lane; the restore leg starts once the
    /// outbound leg lands, plus the produce delay.
    pub fn start_round_trip(
        &mut self,
        net: &Net,
        place: &NodeId,
        transition: &NodeId,
        arc: &NetArc,
        on_consume_complete: Option<Completion>,
        on_restore_complete: Option<Completion>,
    ) -> Option<FlowPair> {
        let consume = self.plan_leg(net, place, transition, arc)?;
        let restore = self.plan_leg(net, transition, place, arc)?;
        Some(self.schedule_pair(consume, restore, on_consume_complete, on_restore_complete))
    }

    fn schedule_pair(
        &mut self,
        consume: Leg,
        produce: Leg,
        on_consume_complete: Option<Completion>,
        on_produce_complete: Option<Completion>,
    ) -> FlowPair {
        let now = self.now();
        let produce_at = now + consume.duration + self.timing().produce_delay();
        FlowPair {
            consume: self.schedule(AnimationKind::Consume, consume, now, on_consume_complete),
            produce: self.schedule(
                AnimationKind::Produce,
                produce,
                produce_at,
                on_produce_complete,
            ),
        }
    }

    /// Drive one frame; returns completions crossed during it
    pub fn on_frame(&mut self) -> Vec<CompletionEvent> {
        self.scheduler.on_frame()
    }

    pub fn has_active_animations(&self) -> bool {
        self.scheduler.has_active()
    }

    /// Cancel every animation
    pub fn clear(&mut self) {
        self.scheduler.clear();
    }

    /// Skip to the end of every animation, returning their completions
    pub fn complete_current_animations(&mut self) -> Vec<CompletionEvent> {
        self.scheduler.complete_current()
    }

    /// Read-only view for the renderer
    pub fn animation_state(&self) -> Vec<AnimationRecord> {
        self.scheduler.snapshot()
    }
}

fn find_arc<'a>(net: &'a Net, from: &NodeId, to: &NodeId, kind: ArcKind) -> Option<&'a NetArc> {
    net.arcs()
        .iter()
        .find(|a| a.kind == kind && &a.source == from && &a.target == to)
}
