//! [`CrossroadController`] – drives one paired intersection.
//!
//! The controller owns its two [`SignalHead`] records and the current
//! [`CyclePhase`].  A single timer handle advances the cycle; sensor events
//! arriving through the [`TopicRouter`] may preempt it.
//!
//! # Serialization
//!
//! Every phase mutation and every timer (re)arm happens under one mutex.
//! Timers carry a generation number: arming a new timer aborts the old task
//! and bumps the generation, so a stale timer that already woke up finds a
//! newer generation and does nothing.  At most one timer is ever live.
//!
//! The transport is never called under the lock.  State changes are posted
//! to the [`Outbox`], whose pump performs the (possibly suspending) transport
//! call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossroads_middleware::{Outbox, TopicRouter};
use crossroads_types::{
    topics, CrossroadError, CrossroadId, CrossroadSnapshot, HeadId, Level, Phase, SensorKind,
    SignalHead, Timing,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cycle::{CyclePhase, Side, PREEMPT_INTERVAL};

/// A crossroad never holds more heads than this.
pub const MAX_HEADS: usize = 2;

struct Timer {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct CycleState {
    /// Pair order: index 0 is head A.
    heads: Vec<SignalHead>,
    cycle: Option<CyclePhase>,
    timer: Option<Timer>,
    generation: u64,
    subscriptions: Vec<String>,
}

impl CycleState {
    fn side_of(&self, head: &HeadId) -> Option<Side> {
        self.heads
            .iter()
            .position(|h| &h.id == head)
            .and_then(Side::from_index)
    }

    fn timing(&self, side: Side) -> Option<&Timing> {
        self.heads.get(side.index()).and_then(|h| h.timing.as_ref())
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
    }

    fn enter(&mut self, phase: CyclePhase) {
        self.cycle = Some(phase);
        let (a, b) = phase.phases();
        if let Some(head) = self.heads.get_mut(0) {
            head.phase = a;
        }
        if let Some(head) = self.heads.get_mut(1) {
            head.phase = b;
        }
    }
}

struct Inner {
    id: CrossroadId,
    router: TopicRouter,
    outbox: Outbox,
    state: Mutex<CycleState>,
}

/// Phase controller for one crossroad.  Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CrossroadController {
    inner: Arc<Inner>,
}

impl CrossroadController {
    /// Create an empty crossroad.
    pub fn new(id: CrossroadId, router: TopicRouter, outbox: Outbox) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                router,
                outbox,
                state: Mutex::new(CycleState::default()),
            }),
        }
    }

    pub fn id(&self) -> CrossroadId {
        self.inner.id
    }

    /// Append `head` to the pair with its phase set to red.
    ///
    /// # Errors
    ///
    /// [`CrossroadError::CrossroadFull`] when two heads are already present,
    /// [`CrossroadError::HeadAlreadyPlaced`] when `head` is already a member.
    /// Nothing is changed on error.
    pub fn add_head(&self, mut head: SignalHead) -> Result<(), CrossroadError> {
        let mut state = self.inner.lock();
        if state.heads.iter().any(|h| h.id == head.id) {
            return Err(CrossroadError::HeadAlreadyPlaced(head.id));
        }
        if state.heads.len() >= MAX_HEADS {
            return Err(CrossroadError::CrossroadFull {
                crossroad: self.inner.id,
                head: head.id,
            });
        }
        head.phase = Phase::Red;
        info!(crossroad = %self.inner.id, head = %head.id, "head joined");
        state.heads.push(head);
        Ok(())
    }

    /// Remove `head`, stopping the cycle first if it is running.
    pub fn remove_head(&self, head: &HeadId) -> Option<SignalHead> {
        let mut state = self.inner.lock();
        let index = state.heads.iter().position(|h| &h.id == head)?;
        self.inner.stop_locked(&mut state);
        state.cycle = None;
        info!(crossroad = %self.inner.id, %head, "head removed");
        Some(state.heads.remove(index))
    }

    pub fn contains(&self, head: &HeadId) -> bool {
        self.inner.lock().heads.iter().any(|h| &h.id == head)
    }

    pub fn head_count(&self) -> usize {
        self.inner.lock().heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head_count() == 0
    }

    /// Assign timings in pair order.
    ///
    /// A running cycle picks the new values up at its next edge.
    pub fn configure(&self, timings: &[Timing]) -> Result<(), CrossroadError> {
        let mut state = self.inner.lock();
        if timings.len() != state.heads.len() {
            return Err(CrossroadError::InvalidConfiguration(format!(
                "{} timing(s) given for {} head(s)",
                timings.len(),
                state.heads.len()
            )));
        }
        for (head, timing) in state.heads.iter_mut().zip(timings) {
            head.timing = Some(*timing);
        }
        debug!(crossroad = %self.inner.id, ?timings, "configured");
        Ok(())
    }

    /// Assign the timing of a single head.
    pub fn set_timing(&self, head: &HeadId, timing: Timing) -> Result<(), CrossroadError> {
        let mut state = self.inner.lock();
        let record = state
            .heads
            .iter_mut()
            .find(|h| &h.id == head)
            .ok_or_else(|| CrossroadError::UnknownHead(head.clone()))?;
        record.timing = Some(timing);
        Ok(())
    }

    /// Start (or restart) the cycle at `(green, red)`.
    ///
    /// Any pending timer is cancelled first, so calling `start` twice leaves
    /// exactly one timer.  The initial state is published immediately.
    ///
    /// # Errors
    ///
    /// [`CrossroadError::InvalidConfiguration`] unless the crossroad has
    /// exactly two heads and both have timing.  Nothing changes on error.
    pub fn start(&self) -> Result<(), CrossroadError> {
        let mut state = self.inner.lock();
        if state.heads.len() != MAX_HEADS {
            return Err(CrossroadError::InvalidConfiguration(format!(
                "crossroad {} has {} head(s); a cycle needs {MAX_HEADS}",
                self.inner.id,
                state.heads.len()
            )));
        }
        if let Some(head) = state.heads.iter().find(|h| h.timing.is_none()) {
            return Err(CrossroadError::InvalidConfiguration(format!(
                "head {} has no timing",
                head.id
            )));
        }

        state.cancel_timer();
        state.enter(CyclePhase::AGreen);
        self.inner.subscribe_sensors(&mut state);
        let dwell = CyclePhase::AGreen.dwell(state.timing(Side::A), state.timing(Side::B));
        self.inner.arm(&mut state, dwell);
        self.inner.publish_phases(&state);
        info!(crossroad = %self.inner.id, ?dwell, "cycle started");
        Ok(())
    }

    /// Stop the cycle.
    ///
    /// Sensor subscriptions are removed first, then the pending timer is
    /// cancelled.  Once this returns nothing will change the phases until the
    /// next [`start`](Self::start).  Heads keep their last commanded phase.
    pub fn stop(&self) {
        let mut state = self.inner.lock();
        if self.inner.stop_locked(&mut state) {
            info!(crossroad = %self.inner.id, "cycle stopped");
        }
    }

    /// `true` iff a transition timer is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.inner.lock().timer.is_some()
    }

    /// Current joint state, if a cycle has been started.
    pub fn cycle_phase(&self) -> Option<CyclePhase> {
        self.inner.lock().cycle
    }

    /// Value copy of the crossroad for display.
    pub fn snapshot(&self) -> CrossroadSnapshot {
        let state = self.inner.lock();
        CrossroadSnapshot {
            id: self.inner.id,
            heads: state.heads.clone(),
            running: state.timer.is_some(),
        }
    }

    /// Handle an inbound sensor message.
    ///
    /// Called by the router for the four subscribed sensor topics; exposed so
    /// other transports can inject events directly.  Malformed payloads and
    /// events for heads that are not green are ignored.
    pub fn handle_sensor(&self, topic: &str, payload: &str) {
        self.inner.handle_sensor(topic, payload);
    }
}

impl std::fmt::Debug for CrossroadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossroadController")
            .field("id", &self.inner.id)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the pending timer with one firing after `delay`.
    fn arm(self: &Arc<Self>, state: &mut CycleState, delay: Duration) {
        state.cancel_timer();
        state.generation += 1;
        let generation = state.generation;
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.on_timer(generation);
            }
        });
        state.timer = Some(Timer { generation, handle });
    }

    fn on_timer(self: &Arc<Self>, generation: u64) {
        let mut state = self.lock();
        match &state.timer {
            Some(timer) if timer.generation == generation => {}
            _ => {
                debug!(crossroad = %self.id, generation, "stale timer ignored");
                return;
            }
        }
        // This task is the timer; let it finish instead of aborting it.
        state.timer = None;

        let Some(current) = state.cycle else {
            return;
        };
        let next = current.next();
        state.enter(next);
        let dwell = next.dwell(state.timing(Side::A), state.timing(Side::B));
        self.arm(&mut state, dwell);
        self.publish_phases(&state);
        debug!(crossroad = %self.id, from = ?current, to = ?next, ?dwell, "phase advanced");
    }

    fn handle_sensor(self: &Arc<Self>, topic: &str, payload: &str) {
        let Some((head, kind)) = topics::parse_sensor(topic) else {
            debug!(crossroad = %self.id, %topic, "not a sensor topic; ignored");
            return;
        };
        let level = match kind.parse_level(payload) {
            Ok(level) => level,
            Err(e) => {
                warn!(crossroad = %self.id, %topic, error = %e, "malformed sensor payload dropped");
                return;
            }
        };
        if level != Level::High {
            return;
        }

        let mut state = self.lock();
        if state.timer.is_none() {
            debug!(crossroad = %self.id, %head, "cycle not running; sensor event ignored");
            return;
        }
        let (Some(side), Some(current)) = (state.side_of(&head), state.cycle) else {
            return;
        };
        let Some(forced) = current.preempted(side) else {
            debug!(crossroad = %self.id, %head, phase = %current.phase_of(side), "head not green; sensor event ignored");
            return;
        };

        state.enter(forced);
        self.arm(&mut state, PREEMPT_INTERVAL);
        self.publish_phases(&state);
        info!(crossroad = %self.id, %head, sensor = %kind, "cycle preempted");
    }

    fn subscribe_sensors(self: &Arc<Self>, state: &mut CycleState) {
        let patterns: Vec<String> = state
            .heads
            .iter()
            .flat_map(|h| SensorKind::ALL.map(|kind| topics::sensor(&h.id, kind)))
            .collect();
        for pattern in &patterns {
            let weak = Arc::downgrade(self);
            self.router.subscribe(pattern.clone(), move |topic, payload| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_sensor(topic, payload);
                }
            });
        }
        state.subscriptions = patterns;
    }

    /// Returns `true` if a cycle was running.
    fn stop_locked(&self, state: &mut CycleState) -> bool {
        for pattern in state.subscriptions.drain(..) {
            self.router.unsubscribe(&pattern);
        }
        let was_running = state.timer.is_some();
        state.cancel_timer();
        was_running
    }

    fn publish_phases(&self, state: &CycleState) {
        if !state.heads.iter().all(|h| h.phase.is_defined()) {
            return;
        }
        for head in &state.heads {
            self.outbox.post(topics::state(&head.id), head.phase.as_str());
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for pattern in state.subscriptions.drain(..) {
            self.router.unsubscribe(&pattern);
        }
        state.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossroads_middleware::MemoryPublisher;
    use tokio::time::{sleep, Instant};

    const LDR_HIGH: &str = r#"{"ldrState":"HIGH"}"#;
    const BUTTON_HIGH: &str = r#"{"buttonState":"HIGH"}"#;

    struct Rig {
        router: TopicRouter,
        publisher: MemoryPublisher,
        controller: CrossroadController,
        t0: Instant,
    }

    fn rig(a: Timing, b: Timing) -> Rig {
        let router = TopicRouter::new();
        let publisher = MemoryPublisher::new();
        let (outbox, _pump) = Outbox::spawn(Arc::new(publisher.clone()));
        let controller = CrossroadController::new(CrossroadId::new(), router.clone(), outbox);
        controller
            .add_head(SignalHead::new("H1").with_timing(a))
            .unwrap();
        controller
            .add_head(SignalHead::new("H2").with_timing(b))
            .unwrap();
        Rig {
            router,
            publisher,
            controller,
            t0: Instant::now(),
        }
    }

    fn scenario() -> Rig {
        rig(Timing::new(10, 3, 0), Timing::new(0, 4, 8))
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance_to(rig: &Rig, millis: u64) {
        sleep((rig.t0 + Duration::from_millis(millis)).saturating_duration_since(Instant::now())).await;
        settle().await;
    }

    /// Published (ms since t0, H1 phase, H2 phase) frames.
    fn frames(rig: &Rig) -> Vec<(u128, String, String)> {
        let messages = rig.publisher.messages();
        assert_eq!(messages.len() % 2, 0, "phases are published in pairs");
        messages
            .chunks(2)
            .map(|pair| {
                assert_eq!(pair[0].topic, "traffic-light/state/H1");
                assert_eq!(pair[1].topic, "traffic-light/state/H2");
                assert_eq!(pair[0].at, pair[1].at);
                (
                    pair[0].at.duration_since(rig.t0).as_millis(),
                    pair[0].payload.clone(),
                    pair[1].payload.clone(),
                )
            })
            .collect()
    }

    fn frame(ms: u128, a: &str, b: &str) -> (u128, String, String) {
        (ms, a.to_string(), b.to_string())
    }

    fn phases(rig: &Rig) -> Vec<Phase> {
        rig.controller.snapshot().phases()
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_reference_sequence() {
        let rig = scenario();
        rig.controller.start().unwrap();
        advance_to(&rig, 26_000).await;

        assert_eq!(
            frames(&rig),
            vec![
                frame(0, "green", "red"),
                frame(3_000, "yellow", "red"),
                frame(11_000, "red", "green"),
                frame(15_000, "red", "yellow"),
                frame(25_000, "green", "red"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn heads_never_green_together() {
        let configs = [
            (Timing::new(10, 3, 0), Timing::new(0, 4, 8)),
            (Timing::new(1, 1, 1), Timing::new(1, 1, 1)),
            (Timing::new(7, 0, 2), Timing::new(5, 2, 0)),
        ];
        for (a, b) in configs {
            let rig = rig(a, b);
            rig.controller.start().unwrap();
            advance_to(&rig, 120_000).await;
            rig.controller.stop();

            let frames = frames(&rig);
            assert!(frames.len() > 4);
            let order = ["green/red", "yellow/red", "red/green", "red/yellow"];
            for (i, (_, h1, h2)) in frames.iter().enumerate() {
                assert!(!(h1 == "green" && h2 == "green"));
                assert_eq!(format!("{h1}/{h2}"), order[i % 4], "frame {i} for {a:?} {b:?}");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn running_reflects_start_and_stop() {
        let rig = scenario();
        assert!(!rig.controller.is_running());
        rig.controller.start().unwrap();
        assert!(rig.controller.is_running());
        advance_to(&rig, 5_000).await;
        assert!(rig.controller.is_running());
        rig.controller.stop();
        assert!(!rig.controller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_keeps_a_single_timer() {
        let rig = scenario();
        rig.controller.start().unwrap();
        advance_to(&rig, 1_000).await;
        rig.controller.start().unwrap();

        // The first start's edge at 3s must not fire.
        advance_to(&rig, 3_500).await;
        assert_eq!(phases(&rig), vec![Phase::Green, Phase::Red]);

        advance_to(&rig, 12_500).await;
        assert_eq!(
            frames(&rig),
            vec![
                frame(0, "green", "red"),
                frame(1_000, "green", "red"),
                frame(4_000, "yellow", "red"),
                frame(12_000, "red", "green"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_total() {
        let rig = scenario();
        rig.controller.start().unwrap();
        assert_eq!(rig.router.len(), 4);
        advance_to(&rig, 4_000).await;

        rig.controller.stop();
        assert!(rig.router.is_empty());
        let published = rig.publisher.messages().len();

        assert_eq!(rig.router.route("traffic-light/H1/ldr-state", LDR_HIGH), 0);
        rig.controller.handle_sensor("traffic-light/H1/ldr-state", LDR_HIGH);
        advance_to(&rig, 120_000).await;

        assert_eq!(rig.publisher.messages().len(), published);
        // Last commanded phase is retained.
        assert_eq!(phases(&rig), vec![Phase::Yellow, Phase::Red]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_without_start_is_noop() {
        let rig = scenario();
        rig.controller.stop();
        assert!(!rig.controller.is_running());
        assert_eq!(phases(&rig), vec![Phase::Red, Phase::Red]);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribes_both_sensors_of_both_heads() {
        let rig = scenario();
        rig.controller.start().unwrap();
        assert_eq!(
            rig.router.patterns(),
            vec![
                "traffic-light/H1/ldr-state",
                "traffic-light/H1/walker-button",
                "traffic-light/H2/ldr-state",
                "traffic-light/H2/walker-button",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn start_requires_two_configured_heads() {
        let router = TopicRouter::new();
        let publisher = MemoryPublisher::new();
        let (outbox, _pump) = Outbox::spawn(Arc::new(publisher.clone()));
        let controller = CrossroadController::new(CrossroadId::new(), router.clone(), outbox);

        controller
            .add_head(SignalHead::new("H1").with_timing(Timing::new(5, 2, 5)))
            .unwrap();
        let err = controller.start().unwrap_err();
        assert!(matches!(err, CrossroadError::InvalidConfiguration(_)));

        controller.add_head(SignalHead::new("H2")).unwrap();
        let err = controller.start().unwrap_err();
        assert!(matches!(err, CrossroadError::InvalidConfiguration(_)));

        settle().await;
        assert!(!controller.is_running());
        assert!(router.is_empty());
        assert!(publisher.messages().is_empty());
        assert_eq!(controller.snapshot().phases(), vec![Phase::Red, Phase::Red]);
        assert_eq!(controller.cycle_phase(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn ldr_preempts_green_head() {
        let rig = rig(Timing::new(10, 20, 0), Timing::new(0, 4, 8));
        rig.controller.start().unwrap();
        advance_to(&rig, 1_000).await;

        assert_eq!(rig.router.route("traffic-light/H1/ldr-state", LDR_HIGH), 1);
        assert_eq!(phases(&rig), vec![Phase::Yellow, Phase::Red]);

        advance_to(&rig, 2_900).await;
        assert_eq!(phases(&rig), vec![Phase::Yellow, Phase::Red]);

        // Window closes at 1s + 2s; the table resumes from there.
        advance_to(&rig, 7_500).await;
        assert_eq!(
            frames(&rig),
            vec![
                frame(0, "green", "red"),
                frame(1_000, "yellow", "red"),
                frame(3_000, "red", "green"),
                frame(7_000, "red", "yellow"),
            ]
        );

        // The cancelled 20s edge never fires; the only later frame is the
        // regular return to A at 7s + A.green.
        advance_to(&rig, 20_500).await;
        let frames = frames(&rig);
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[4], frame(17_000, "green", "red"));
    }

    #[tokio::test(start_paused = true)]
    async fn walker_button_preempts_head_b() {
        let rig = scenario();
        rig.controller.start().unwrap();
        advance_to(&rig, 12_000).await;
        assert_eq!(phases(&rig), vec![Phase::Red, Phase::Green]);

        rig.router.route("traffic-light/H2/walker-button", BUTTON_HIGH);
        assert_eq!(phases(&rig), vec![Phase::Red, Phase::Yellow]);

        advance_to(&rig, 14_500).await;
        assert_eq!(phases(&rig), vec![Phase::Green, Phase::Red]);
        assert_eq!(
            frames(&rig).last().cloned(),
            Some(frame(14_000, "green", "red"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sensor_for_non_green_head_is_ignored() {
        let rig = scenario();
        rig.controller.start().unwrap();
        advance_to(&rig, 1_000).await;

        rig.router.route("traffic-light/H2/ldr-state", LDR_HIGH);
        rig.router.route("traffic-light/H2/walker-button", BUTTON_HIGH);
        settle().await;
        assert_eq!(phases(&rig), vec![Phase::Green, Phase::Red]);
        assert_eq!(frames(&rig).len(), 1);

        // Regular edge still fires on time.
        advance_to(&rig, 3_500).await;
        assert_eq!(frames(&rig).last().cloned(), Some(frame(3_000, "yellow", "red")));
    }

    #[tokio::test(start_paused = true)]
    async fn yellow_head_is_not_preempted_again() {
        let rig = scenario();
        rig.controller.start().unwrap();
        advance_to(&rig, 4_000).await;
        assert_eq!(phases(&rig), vec![Phase::Yellow, Phase::Red]);

        rig.router.route("traffic-light/H1/ldr-state", LDR_HIGH);
        advance_to(&rig, 10_000).await;
        assert_eq!(phases(&rig), vec![Phase::Yellow, Phase::Red]);
        assert_eq!(frames(&rig).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_and_low_payloads_are_ignored() {
        let rig = scenario();
        rig.controller.start().unwrap();
        advance_to(&rig, 1_000).await;

        for payload in [
            "garbage",
            "",
            "{}",
            r#"{"ldrState":"LOW"}"#,
            r#"{"ldrState":42}"#,
            BUTTON_HIGH,
        ] {
            rig.router.route("traffic-light/H1/ldr-state", payload);
        }
        rig.router.route("traffic-light/H1/walker-button", r#"{"buttonState":"LOW"}"#);
        settle().await;

        assert_eq!(phases(&rig), vec![Phase::Green, Phase::Red]);
        assert!(rig.controller.is_running());
        advance_to(&rig, 3_500).await;
        assert_eq!(frames(&rig).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn new_timing_applies_at_next_edge() {
        let rig = scenario();
        rig.controller.start().unwrap();
        rig.controller
            .configure(&Timing::paired(10, 6, 8, 4))
            .unwrap();
        // Current dwell was armed with the old 3s yellow; the next one uses B.red = 10.
        advance_to(&rig, 13_500).await;
        let frames = frames(&rig);
        assert_eq!(frames[1], frame(3_000, "yellow", "red"));
        assert_eq!(frames[2], frame(13_000, "red", "green"));
    }

    #[tokio::test(start_paused = true)]
    async fn add_head_enforces_pair_limit() {
        let rig = scenario();
        let err = rig.controller.add_head(SignalHead::new("H3")).unwrap_err();
        assert!(matches!(err, CrossroadError::CrossroadFull { .. }));
        assert_eq!(rig.controller.head_count(), 2);

        let err = rig.controller.add_head(SignalHead::new("H1")).unwrap_err();
        assert_eq!(err, CrossroadError::HeadAlreadyPlaced(HeadId::from("H1")));
    }

    #[tokio::test(start_paused = true)]
    async fn configure_rejects_count_mismatch() {
        let rig = scenario();
        let err = rig.controller.configure(&[Timing::new(1, 1, 1)]).unwrap_err();
        assert!(matches!(err, CrossroadError::InvalidConfiguration(_)));

        let err = rig
            .controller
            .set_timing(&HeadId::from("ghost"), Timing::new(1, 1, 1))
            .unwrap_err();
        assert_eq!(err, CrossroadError::UnknownHead(HeadId::from("ghost")));
    }

    #[tokio::test(start_paused = true)]
    async fn removing_a_head_stops_the_cycle() {
        let rig = scenario();
        rig.controller.start().unwrap();
        let removed = rig.controller.remove_head(&HeadId::from("H2")).unwrap();
        assert_eq!(removed.id, HeadId::from("H2"));
        assert!(!rig.controller.is_running());
        assert!(rig.router.is_empty());
        assert_eq!(rig.controller.head_count(), 1);
        assert!(rig.controller.remove_head(&HeadId::from("H2")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_is_a_copy() {
        let rig = scenario();
        let mut snap = rig.controller.snapshot();
        snap.heads[0].phase = Phase::Green;
        assert_eq!(phases(&rig), vec![Phase::Red, Phase::Red]);
        assert!(!snap.running);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_controller_releases_subscriptions() {
        let rig = scenario();
        rig.controller.start().unwrap();
        let router = rig.router.clone();
        drop(rig);
        assert!(router.is_empty());
    }
}
