//! Firing cycle tests against a scripted oracle and a manual clock

use pollster::block_on;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokenflow_animation::{AnimationKind, Clock, FrameSignal, ManualClock};
use tokenflow_core::{Arc as NetArc, ArcKind, Net, NodeId, Place, Point, Transition};
use tokenflow_engine::{
    EngineConfig, EngineError, EngineSettings, FiringOrchestrator, FiringOutcome, FiringState,
    ANIMATION_IN_PROGRESS, CONFLICT_PENDING,
};
use tokenflow_oracle::{NetPayload, Oracle, OracleError, Result as OracleResult};

/// Oracle that replays canned answers and records what it was sent
#[derive(Default)]
struct ScriptedOracle {
    replies: Mutex<VecDeque<OracleResult<NetPayload>>>,
    requests: Mutex<Vec<NetPayload>>,
}

impl ScriptedOracle {
    fn reply(&self, reply: OracleResult<NetPayload>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    fn requests(&self) -> Vec<NetPayload> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: &NetPayload) -> OracleResult<NetPayload> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Network("no scripted reply".into())))
    }
}

impl Oracle for ScriptedOracle {
    async fn process(&self, request: &NetPayload) -> OracleResult<NetPayload> {
        self.next(request)
    }

    async fn resolve(&self, request: &NetPayload) -> OracleResult<NetPayload> {
        self.next(request)
    }
}

struct Harness {
    engine: FiringOrchestrator<ScriptedOracle>,
    clock: ManualClock,
    frames: FrameSignal,
}

impl Harness {
    fn new(settings: EngineSettings) -> Self {
        let clock = ManualClock::new();
        let frames = FrameSignal::new();
        let config = EngineConfig {
            engine: settings,
            ..EngineConfig::default()
        };
        let engine = FiringOrchestrator::new(
            ScriptedOracle::default(),
            Arc::new(clock.clone()),
            Arc::new(frames.clone()),
            &config,
        );
        Self {
            engine,
            clock,
            frames,
        }
    }

    fn oracle(&self) -> &ScriptedOracle {
        self.engine.oracle()
    }

    /// Drive frames in 10ms steps until nothing is left or `limit_ms` passes
    fn run(&mut self, net: &mut Net, limit_ms: u64) {
        let mut elapsed = 0;
        while self.engine.has_active_animations() && elapsed < limit_ms {
            self.clock.advance_ms(10);
            elapsed += 10;
            if self.frames.take() {
                self.engine.on_frame(net);
            }
        }
    }
}

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

/// P(3) -> T -> Q(0), laid out left to right
fn chain() -> Net {
    let mut net = Net::new();
    net.add_place(Place::new("P", Point::new(0.0, 0.0)).with_tokens(3));
    net.add_transition(Transition::new("T", Point::new(200.0, 0.0)));
    net.add_place(Place::new("Q", Point::new(400.0, 0.0)));
    net.add_arc(NetArc::new("a1", ArcKind::Regular, "P", "T"));
    net.add_arc(NetArc::new("a2", ArcKind::Regular, "T", "Q"));
    net
}

/// P(1) feeding T1 -> Q1 and T2 -> Q2
fn choice() -> Net {
    let mut net = Net::new();
    net.add_place(Place::new("P", Point::new(0.0, 0.0)).with_tokens(1));
    net.add_transition(Transition::new("T1", Point::new(200.0, -100.0)));
    net.add_transition(Transition::new("T2", Point::new(200.0, 100.0)));
    net.add_place(Place::new("Q1", Point::new(400.0, -100.0)));
    net.add_place(Place::new("Q2", Point::new(400.0, 100.0)));
    net.add_arc(NetArc::new("a1", ArcKind::Regular, "P", "T1"));
    net.add_arc(NetArc::new("a2", ArcKind::Regular, "P", "T2"));
    net.add_arc(NetArc::new("a3", ArcKind::Regular, "T1", "Q1"));
    net.add_arc(NetArc::new("a4", ArcKind::Regular, "T2", "Q2"));
    net
}

/// Oracle answer: `net` with the given counts and only `enabled` transitions enabled
fn answer(net: &Net, tokens: &[(&str, u32)], enabled: &[&str]) -> NetPayload {
    let mut next = net.clone();
    for (place, count) in tokens {
        next.set_tokens(&id(place), *count);
    }
    for t in next.transitions_mut() {
        t.enabled = enabled.contains(&t.id.as_str());
    }
    NetPayload::from_net(&next)
}

fn enabled(net: &Net) -> Vec<(String, bool)> {
    net.transitions()
        .map(|t| (t.id.to_string(), t.enabled))
        .collect()
}

#[test]
fn test_fire_moves_token_along_chain() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    h.oracle().reply(Ok(answer(&net, &[("P", 2), ("Q", 1)], &["T"])));

    let outcome = block_on(h.engine.fire(&mut net)).unwrap();
    assert_eq!(
        outcome,
        FiringOutcome::Animating {
            fired: vec![id("T")],
            scheduled: 2
        }
    );
    assert_eq!(h.engine.state(), FiringState::Idle);
    assert!(h.frames.is_pending());

    // Input place shows its new count at once, the output waits for the token
    assert_eq!(net.tokens(&id("P")), Some(2));
    assert_eq!(net.tokens(&id("Q")), Some(0));

    let records = h.engine.animator().animation_state();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind, AnimationKind::Consume);
    assert_eq!(records[1].kind, AnimationKind::Produce);
    let produce_start = records[1].start_at;
    let produce_end = records[1].end_at();

    // Still nothing in Q while the produce leg has not started
    h.run(&mut net, (produce_start.as_millis() as u64).saturating_sub(20));
    assert_eq!(net.tokens(&id("Q")), Some(0));

    h.run(&mut net, 5_000);
    assert_eq!(net.tokens(&id("Q")), Some(1));
    assert_eq!(net.tokens(&id("P")), Some(2));
    assert!(!h.engine.has_active_animations());
    assert!(h.clock.now() >= produce_end);
}

#[test]
fn test_produce_commits_before_leg_finishes() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    h.oracle().reply(Ok(answer(&net, &[("P", 2), ("Q", 1)], &["T"])));
    block_on(h.engine.fire(&mut net)).unwrap();

    let produce = h.engine.animator().animation_state()[1].clone();
    let mut committed_early = false;
    while h.engine.has_active_animations() {
        h.clock.advance_ms(10);
        if h.frames.take() {
            h.engine.on_frame(&mut net);
        }
        if net.tokens(&id("Q")) == Some(1) && h.engine.has_active_animations() {
            committed_early = true;
            break;
        }
    }
    assert!(committed_early);
    let live = h.engine.animator().animation_state();
    let record = live.iter().find(|r| r.kind == AnimationKind::Produce).unwrap();
    assert_eq!(record.start_at, produce.start_at);
    assert!(record.progress >= 0.85);
}

#[test]
fn test_produce_starts_after_consume_plus_delay() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    h.oracle().reply(Ok(answer(&net, &[("P", 2), ("Q", 1)], &["T"])));
    block_on(h.engine.fire(&mut net)).unwrap();

    let records = h.engine.animator().animation_state();
    let consume = &records[0];
    let produce = &records[1];
    assert_eq!(consume.start_at, Duration::ZERO);
    assert_eq!(
        produce.start_at,
        consume.end_at() + Duration::from_millis(50)
    );
    assert_eq!(consume.source, id("P"));
    assert_eq!(consume.target, id("T"));
    assert_eq!(produce.source, id("T"));
    assert_eq!(produce.target, id("Q"));
}

#[test]
fn test_request_carries_net_and_settings() {
    let settings = EngineSettings::default().with_title("Chain");
    let mut h = Harness::new(settings);
    let mut net = chain();
    h.oracle().reply(Ok(answer(&net, &[("P", 2), ("Q", 1)], &["T"])));
    block_on(h.engine.fire(&mut net)).unwrap();

    let requests = h.oracle().requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.places.len(), 2);
    assert_eq!(request.places[0].tokens, Some(3));
    assert_eq!(request.deterministic_mode, Some(false));
    assert_eq!(request.title.as_deref(), Some("Chain"));
    assert_eq!(request.selected_transition_id, None);
}

#[test]
fn test_fire_rejected_while_animating() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    h.oracle().reply(Ok(answer(&net, &[("P", 2), ("Q", 1)], &["T"])));
    block_on(h.engine.fire(&mut net)).unwrap();

    let outcome = block_on(h.engine.fire(&mut net)).unwrap();
    assert_eq!(outcome, FiringOutcome::Rejected);
    assert_eq!(h.oracle().requests().len(), 1);
    assert_eq!(h.engine.notices(), vec![ANIMATION_IN_PROGRESS.to_string()]);

    h.clock.advance_ms(2000);
    assert!(h.engine.notices().is_empty());
}

#[test]
fn test_deterministic_conflict_waits_for_choice() {
    let mut h = Harness::new(EngineSettings::default().with_deterministic_mode(true));
    let mut net = choice();
    h.oracle().reply(Ok(answer(&net, &[], &["T1", "T2"])));

    let outcome = block_on(h.engine.fire(&mut net)).unwrap();
    assert_eq!(outcome, FiringOutcome::Conflict(vec![id("T1"), id("T2")]));
    assert_eq!(h.engine.state(), FiringState::ConflictPending);
    assert_eq!(h.engine.conflicting_transitions(), &[id("T1"), id("T2")]);
    assert!(!h.engine.has_active_animations());
    assert!(!h.frames.is_pending());
    assert_eq!(net.tokens(&id("P")), Some(1));
    assert_eq!(
        enabled(&net),
        vec![("T1".to_string(), true), ("T2".to_string(), true)]
    );
    assert_eq!(h.oracle().requests()[0].deterministic_mode, Some(true));

    // Plain firing is refused until the conflict is settled
    let outcome = block_on(h.engine.fire(&mut net)).unwrap();
    assert_eq!(outcome, FiringOutcome::Rejected);
    assert_eq!(h.engine.notices(), vec![CONFLICT_PENDING.to_string()]);
    assert_eq!(h.oracle().requests().len(), 1);
}

#[test]
fn test_resolve_fires_chosen_transition() {
    let mut h = Harness::new(EngineSettings::default().with_deterministic_mode(true));
    let mut net = choice();
    h.oracle().reply(Ok(answer(&net, &[], &["T1", "T2"])));
    block_on(h.engine.fire(&mut net)).unwrap();

    h.oracle()
        .reply(Ok(answer(&net, &[("P", 0), ("Q1", 1)], &["T1"])));
    let outcome = block_on(h.engine.resolve(&mut net, &id("T1"))).unwrap();
    assert_eq!(
        outcome,
        FiringOutcome::Animating {
            fired: vec![id("T1")],
            scheduled: 2
        }
    );
    assert!(h.engine.conflicting_transitions().is_empty());
    assert_eq!(
        h.oracle().requests()[1].selected_transition_id,
        Some(id("T1"))
    );

    h.run(&mut net, 5_000);
    assert_eq!(net.tokens(&id("P")), Some(0));
    assert_eq!(net.tokens(&id("Q1")), Some(1));
    assert_eq!(net.tokens(&id("Q2")), Some(0));
}

#[test]
fn test_resolve_failure_reverts_preview() {
    let mut h = Harness::new(EngineSettings::default().with_deterministic_mode(true));
    let mut net = choice();
    h.oracle().reply(Ok(answer(&net, &[], &["T1", "T2"])));
    block_on(h.engine.fire(&mut net)).unwrap();

    h.oracle().reply(Err(OracleError::Status {
        status: 500,
        body: "boom".into(),
    }));
    let err = block_on(h.engine.resolve(&mut net, &id("T2"))).unwrap_err();
    assert!(matches!(err, EngineError::Oracle(OracleError::Status { status: 500, .. })));
    assert_eq!(h.engine.state(), FiringState::ConflictPending);
    assert_eq!(
        enabled(&net),
        vec![("T1".to_string(), true), ("T2".to_string(), true)]
    );
    assert_eq!(net.tokens(&id("P")), Some(1));
}

#[test]
fn test_resolve_can_conflict_again() {
    let mut h = Harness::new(EngineSettings::default().with_deterministic_mode(true));
    let mut net = choice();
    h.oracle().reply(Ok(answer(&net, &[], &["T1", "T2"])));
    block_on(h.engine.fire(&mut net)).unwrap();

    h.oracle().reply(Ok(answer(&net, &[], &["T1", "T2"])));
    let outcome = block_on(h.engine.resolve(&mut net, &id("T1"))).unwrap();
    assert_eq!(outcome, FiringOutcome::Conflict(vec![id("T1"), id("T2")]));
    assert_eq!(h.engine.state(), FiringState::ConflictPending);
}

#[test]
fn test_resolve_rejects_bad_requests() {
    let mut h = Harness::new(EngineSettings::default().with_deterministic_mode(true));
    let mut net = choice();

    let err = block_on(h.engine.resolve(&mut net, &id("T1"))).unwrap_err();
    assert!(matches!(err, EngineError::NoConflict));

    h.oracle().reply(Ok(answer(&net, &[], &["T1", "T2"])));
    block_on(h.engine.fire(&mut net)).unwrap();
    let err = block_on(h.engine.resolve(&mut net, &id("P"))).unwrap_err();
    assert!(matches!(err, EngineError::NotInConflict(ref t) if t == &id("P")));
    assert_eq!(h.oracle().requests().len(), 1);
}

#[test]
fn test_nondeterministic_mode_fires_all_enabled() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = choice();
    net.set_tokens(&id("P"), 2);
    h.oracle().reply(Ok(answer(
        &net,
        &[("P", 0), ("Q1", 1), ("Q2", 1)],
        &["T1", "T2"],
    )));

    let outcome = block_on(h.engine.fire(&mut net)).unwrap();
    assert_eq!(
        outcome,
        FiringOutcome::Animating {
            fired: vec![id("T1"), id("T2")],
            scheduled: 4
        }
    );
    h.run(&mut net, 5_000);
    assert_eq!(net.tokens(&id("Q1")), Some(1));
    assert_eq!(net.tokens(&id("Q2")), Some(1));
}

#[test]
fn test_bidirectional_arc_borrows_and_restores() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = Net::new();
    net.add_place(Place::new("R", Point::new(0.0, 0.0)).with_tokens(2));
    net.add_transition(Transition::new("T", Point::new(200.0, 0.0)));
    net.add_arc(NetArc::new("a1", ArcKind::Bidirectional, "R", "T"));
    h.oracle().reply(Ok(answer(&net, &[("R", 2)], &["T"])));

    let outcome = block_on(h.engine.fire(&mut net)).unwrap();
    assert_eq!(
        outcome,
        FiringOutcome::Animating {
            fired: vec![id("T")],
            scheduled: 2
        }
    );
    assert_eq!(net.tokens(&id("R")), Some(1));

    let records = h.engine.animator().animation_state();
    assert_eq!(records[0].target, id("T"));
    assert_eq!(records[1].source, id("T"));
    assert_eq!(
        records[1].start_at,
        records[0].end_at() + Duration::from_millis(50)
    );

    h.engine.skip(&mut net);
    assert_eq!(net.tokens(&id("R")), Some(2));
    assert!(!h.engine.has_active_animations());
}

#[test]
fn test_bidirectional_never_goes_negative() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = Net::new();
    net.add_place(Place::new("R", Point::new(0.0, 0.0)));
    net.add_transition(Transition::new("T", Point::new(200.0, 0.0)));
    net.add_arc(NetArc::new("a1", ArcKind::Bidirectional, "R", "T"));
    h.oracle().reply(Ok(answer(&net, &[], &["T"])));

    block_on(h.engine.fire(&mut net)).unwrap();
    assert_eq!(net.tokens(&id("R")), Some(0));
    h.engine.skip(&mut net);
    assert_eq!(net.tokens(&id("R")), Some(0));
}

#[test]
fn test_inhibitor_arcs_are_not_animated() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    net.add_place(Place::new("I", Point::new(200.0, 200.0)));
    net.add_arc(NetArc::new("a3", ArcKind::Inhibitor, "I", "T"));
    h.oracle().reply(Ok(answer(&net, &[("P", 2), ("Q", 1)], &["T"])));

    let outcome = block_on(h.engine.fire(&mut net)).unwrap();
    assert!(matches!(outcome, FiringOutcome::Animating { scheduled: 2, .. }));
}

#[test]
fn test_reset_discards_pending_commits() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    h.oracle().reply(Ok(answer(&net, &[("P", 2), ("Q", 1)], &["T"])));
    block_on(h.engine.fire(&mut net)).unwrap();

    h.run(&mut net, 100);
    assert!(h.engine.has_active_animations());
    h.engine.reset();

    assert!(!h.engine.has_active_animations());
    assert!(!h.frames.is_pending());
    assert_eq!(net.tokens(&id("Q")), Some(0));
    assert_eq!(h.engine.state(), FiringState::Idle);
}

#[test]
fn test_oracle_failure_leaves_net_untouched() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    h.oracle().reply(Err(OracleError::Network("connection refused".into())));

    let err = block_on(h.engine.fire(&mut net)).unwrap_err();
    assert!(matches!(err, EngineError::Oracle(OracleError::Network(_))));
    assert_eq!(h.engine.state(), FiringState::Idle);
    assert!(!h.engine.has_active_animations());
    assert_eq!(net.tokens(&id("P")), Some(3));
    assert_eq!(net.tokens(&id("Q")), Some(0));

    // The next request goes through normally
    h.oracle().reply(Ok(answer(&net, &[("P", 2), ("Q", 1)], &["T"])));
    assert!(matches!(
        block_on(h.engine.fire(&mut net)).unwrap(),
        FiringOutcome::Animating { .. }
    ));
}

#[test]
fn test_places_missing_from_answer_keep_their_count() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    let mut reply = answer(&net, &[("P", 2)], &["T"]);
    reply.places.retain(|p| p.id.as_str() != "Q");
    h.oracle().reply(Ok(reply));

    block_on(h.engine.fire(&mut net)).unwrap();
    h.engine.skip(&mut net);
    assert_eq!(net.tokens(&id("P")), Some(2));
    assert_eq!(net.tokens(&id("Q")), Some(0));
}

#[test]
fn test_answer_entries_without_values_change_nothing() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    net.add_place(Place::new("S", Point::new(0.0, 300.0)).with_tokens(5));
    net.add_transition(Transition::new("U", Point::new(200.0, 300.0)).with_enabled(true));
    let mut reply = answer(&net, &[("P", 2), ("Q", 1)], &["T"]);
    for place in reply.places.iter_mut().filter(|p| p.id.as_str() == "S") {
        place.tokens = None;
    }
    for transition in reply.transitions.iter_mut().filter(|t| t.id.as_str() == "U") {
        transition.enabled = None;
    }
    h.oracle().reply(Ok(reply));

    let outcome = block_on(h.engine.fire(&mut net)).unwrap();
    assert!(matches!(outcome, FiringOutcome::Animating { ref fired, .. } if fired == &[id("T")]));
    assert_eq!(net.tokens(&id("S")), Some(5));
    assert_eq!(net.transition(&id("U")).map(|t| t.enabled), Some(true));
}

#[test]
fn test_bidirectional_legs_share_a_lane_beside_regular_arc() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = Net::new();
    net.add_place(Place::new("P", Point::new(0.0, 0.0)).with_tokens(1));
    net.add_transition(Transition::new("T", Point::new(200.0, 0.0)));
    net.add_arc(NetArc::new("a1", ArcKind::Regular, "P", "T"));
    net.add_arc(NetArc::new("a2", ArcKind::Bidirectional, "T", "P"));
    h.oracle().reply(Ok(answer(&net, &[("P", 1)], &["T"])));

    block_on(h.engine.fire(&mut net)).unwrap();
    let records = h.engine.animator().animation_state();
    assert_eq!(records.len(), 3);

    let restore = records
        .iter()
        .find(|r| r.kind == AnimationKind::Produce)
        .unwrap();
    assert_eq!(restore.target, id("P"));
    let back = restore.path.point_at(0.5);
    let consumes: Vec<_> = records
        .iter()
        .filter(|r| r.kind == AnimationKind::Consume)
        .map(|r| r.path.point_at(0.5))
        .collect();
    assert_eq!(consumes.len(), 2);

    // Exactly one outbound leg runs in the restore leg's lane
    let same_lane = consumes
        .iter()
        .filter(|p| (p.y - back.y).abs() < 1e-3)
        .count();
    assert_eq!(same_lane, 1);
    assert!(consumes.iter().any(|p| p.y * back.y < 0.0));
}

#[test]
fn test_rejected_fire_keeps_resting_state() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    h.oracle().reply(Ok(answer(&net, &[("P", 2), ("Q", 1)], &["T"])));
    block_on(h.engine.fire(&mut net)).unwrap();

    assert_eq!(
        block_on(h.engine.fire(&mut net)).unwrap(),
        FiringOutcome::Rejected
    );
    assert_eq!(h.engine.state(), FiringState::Idle);
}

#[test]
fn test_unanimated_changes_commit_immediately() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    net.add_place(Place::new("S", Point::new(0.0, 300.0)).with_tokens(1));
    let mut reply = answer(&net, &[("P", 2), ("Q", 1), ("S", 4)], &["T"]);
    reply.places.push(tokenflow_oracle::PlaceDto {
        id: id("ghost"),
        tokens: Some(9),
        ..Default::default()
    });
    h.oracle().reply(Ok(reply));

    block_on(h.engine.fire(&mut net)).unwrap();
    assert_eq!(net.tokens(&id("S")), Some(4));
    assert_eq!(net.tokens(&id("ghost")), None);
    assert_eq!(net.tokens(&id("Q")), Some(0));
}

#[test]
fn test_nothing_enabled_schedules_nothing() {
    let mut h = Harness::new(EngineSettings::default());
    let mut net = chain();
    h.oracle().reply(Ok(answer(&net, &[], &[])));

    let outcome = block_on(h.engine.fire(&mut net)).unwrap();
    assert_eq!(
        outcome,
        FiringOutcome::Animating {
            fired: vec![],
            scheduled: 0
        }
    );
    assert!(!h.engine.has_active_animations());
    assert!(!h.frames.is_pending());
}
