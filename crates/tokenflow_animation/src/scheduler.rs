//! Animation scheduler
//!
//! Owns every in-flight token animation and advances them once per frame.
//! Records live in an arena addressed by [`AnimationId`] and are created
//! through [`SchedulerCommand`]s:
//! - `ScheduleConsume` - a token leaving a place for a transition
//! - `ScheduleProduce` - a token travelling from a transition into a place
//! - `Cancel` - drop everything
//!
//! Completion callbacks are plain [`Completion`] values. A tick returns the
//! ones whose threshold was crossed as [`CompletionEvent`]s and the caller
//! decides what they mean.

use crate::clock::Clock;
use crate::frame::FrameSource;
use crate::timing::TimingConfig;
use slotmap::{new_key_type, SlotMap};
use std::sync::Arc;
use std::time::Duration;
use tokenflow_core::{FlowPath, NodeId, Point};

new_key_type! {
    /// Handle to a scheduled token animation
    pub struct AnimationId;
}

/// Direction of a token relative to the firing transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    /// Place to transition
    Consume,
    /// Transition to place
    Produce,
}

/// Deferred effect attached to an animation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Write an authoritative token count into a place
    CommitTokens { place: NodeId, tokens: u32 },
    /// Opaque tag returned to the host
    Signal(u64),
}

/// A completion whose threshold was crossed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionEvent {
    pub id: AnimationId,
    pub completion: Completion,
}

/// Fully resolved description of one leg
#[derive(Clone, Debug)]
pub struct AnimationRequest {
    pub source: NodeId,
    pub target: NodeId,
    pub path: FlowPath,
    pub start_at: Duration,
    pub duration: Duration,
}

/// Scheduler input
#[derive(Clone, Debug)]
pub enum SchedulerCommand {
    ScheduleConsume {
        request: AnimationRequest,
        on_complete: Option<Completion>,
    },
    ScheduleProduce {
        request: AnimationRequest,
        on_complete: Option<Completion>,
    },
    Cancel,
}

/// One token in flight
#[derive(Clone, Debug)]
pub struct AnimationRecord {
    pub id: AnimationId,
    pub source: NodeId,
    pub target: NodeId,
    pub path: FlowPath,
    /// Eased progress, 0.0 to 1.0, never decreasing
    pub progress: f32,
    pub start_at: Duration,
    pub duration: Duration,
    pub kind: AnimationKind,
    pub on_complete: Option<Completion>,
    completion_fired: bool,
}

impl AnimationRecord {
    /// Whether the record is still waiting for its start time
    pub fn is_pending(&self, now: Duration) -> bool {
        now < self.start_at
    }

    /// Token position for the renderer
    pub fn position(&self) -> Point {
        self.path.point_at(self.progress)
    }

    pub fn end_at(&self) -> Duration {
        self.start_at + self.duration
    }

    fn take_completion(&mut self) -> Option<Completion> {
        if self.completion_fired {
            return None;
        }
        self.completion_fired = true;
        self.on_complete.clone()
    }
}

/// The scheduler that ticks all token animations
///
/// Runs on whatever thread the host's frame callback runs on. A frame is
/// requested from the [`FrameSource`] only while records exist, so an idle
/// scheduler costs nothing.
pub struct AnimationScheduler {
    records: SlotMap<AnimationId, AnimationRecord>,
    clock: Arc<dyn Clock>,
    frames: Arc<dyn FrameSource>,
    timing: TimingConfig,
    last_tick: Option<Duration>,
    frame_requested: bool,
}

impl AnimationScheduler {
    pub fn new(clock: Arc<dyn Clock>, frames: Arc<dyn FrameSource>, timing: TimingConfig) -> Self {
        Self {
            records: SlotMap::with_key(),
            clock,
            frames,
            timing,
            last_tick: None,
            frame_requested: false,
        }
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Apply a command; returns the id of a newly scheduled record
    pub fn submit(&mut self, command: SchedulerCommand) -> Option<AnimationId> {
        match command {
            SchedulerCommand::ScheduleConsume {
                request,
                on_complete,
            } => Some(self.schedule(AnimationKind::Consume, request, on_complete)),
            SchedulerCommand::ScheduleProduce {
                request,
                on_complete,
            } => Some(self.schedule(AnimationKind::Produce, request, on_complete)),
            SchedulerCommand::Cancel => {
                self.clear();
                None
            }
        }
    }

    /// Add a record to the arena
    pub fn schedule(
        &mut self,
        kind: AnimationKind,
        request: AnimationRequest,
        on_complete: Option<Completion>,
    ) -> AnimationId {
        let id = self.records.insert_with_key(|id| AnimationRecord {
            id,
            source: request.source,
            target: request.target,
            path: request.path,
            progress: 0.0,
            start_at: request.start_at,
            duration: request.duration,
            kind,
            on_complete,
            completion_fired: false,
        });

        tracing::debug!(
            "scheduled {:?} {:?}: start={:?} duration={:?}",
            kind,
            id,
            request.start_at,
            request.duration
        );

        // Restart the frame loop lazily when work arrives while idle
        if !self.frame_requested {
            self.frame_requested = true;
            self.frames.request_frame();
        }
        id
    }

    /// Host frame callback
    ///
    /// Ticks at most `target_fps` times per second; earlier frames are
    /// skipped. Requests the next frame while any record remains.
    pub fn on_frame(&mut self) -> Vec<CompletionEvent> {
        self.frame_requested = false;
        if self.records.is_empty() {
            self.last_tick = None;
            return Vec::new();
        }

        let now = self.clock.now();
        let skip = self
            .last_tick
            .is_some_and(|last| now.saturating_sub(last) < self.timing.frame_interval());
        let events = if skip { Vec::new() } else { self.tick(now) };

        if self.records.is_empty() {
            self.last_tick = None;
        } else {
            self.frame_requested = true;
            self.frames.request_frame();
        }
        events
    }

    /// Advance every record to `now`
    ///
    /// Produce records fire their completion once progress reaches the
    /// configured threshold; everything else fires on removal.
    pub fn tick(&mut self, now: Duration) -> Vec<CompletionEvent> {
        self.last_tick = Some(now);
        let easing = self.timing.easing;
        let produce_threshold = self.timing.produce_threshold;

        let mut events = Vec::new();
        let mut finished = Vec::new();

        for (id, record) in self.records.iter_mut() {
            if record.is_pending(now) {
                continue;
            }

            let elapsed = now - record.start_at;
            let fraction = if record.duration.is_zero() {
                1.0
            } else {
                (elapsed.as_secs_f32() / record.duration.as_secs_f32()).min(1.0)
            };
            record.progress = record.progress.max(easing.apply(fraction)).clamp(0.0, 1.0);

            let done = elapsed >= record.duration;
            let threshold = match record.kind {
                AnimationKind::Produce => produce_threshold,
                AnimationKind::Consume => 1.0,
            };
            if done || record.progress >= threshold {
                if let Some(completion) = record.take_completion() {
                    events.push((record.start_at, CompletionEvent { id, completion }));
                }
            }
            if done {
                finished.push(id);
            }
        }

        for id in finished {
            self.records.remove(id);
        }

        events.sort_by_key(|(start_at, _)| *start_at);
        events.into_iter().map(|(_, event)| event).collect()
    }

    /// Drop every record and withdraw the pending frame
    ///
    /// Outstanding completions are discarded.
    pub fn clear(&mut self) {
        if !self.records.is_empty() {
            tracing::debug!("clearing {} animations", self.records.len());
        }
        self.records.clear();
        self.last_tick = None;
        if self.frame_requested {
            self.frame_requested = false;
            self.frames.cancel_frame();
        }
    }

    /// Jump every record to its end state
    ///
    /// Returns all completions that had not fired yet, in start order.
    pub fn complete_current(&mut self) -> Vec<CompletionEvent> {
        let mut records: Vec<AnimationRecord> = self.records.drain().map(|(_, r)| r).collect();
        records.sort_by_key(|r| r.start_at);

        let events = records
            .iter_mut()
            .filter_map(|r| {
                let id = r.id;
                r.take_completion()
                    .map(|completion| CompletionEvent { id, completion })
            })
            .collect();

        self.clear();
        events
    }

    /// Copy of every live record, in start order
    pub fn snapshot(&self) -> Vec<AnimationRecord> {
        let mut records: Vec<AnimationRecord> = self.records.values().cloned().collect();
        records.sort_by_key(|r| r.start_at);
        records
    }

    pub fn get(&self, id: AnimationId) -> Option<&AnimationRecord> {
        self.records.get(id)
    }

    /// Whether any record is pending or active
    pub fn has_active(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
