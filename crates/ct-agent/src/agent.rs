//! `Agent` — one independently scheduled individual.
//!
//! # Tick
//!
//! ```text
//! tick(params):
//!   paused?            → commit neighbors, stop
//!   alive && moving?   → random-walk step
//!   frame counter      → not a day boundary: commit neighbors, stop
//!   day boundary:
//!     ① decide progression (incubation / illness), self-post the outcome
//!     ② spread HaveGerms to committed neighbors   (lock released, may wait)
//!     ③ drain mailbox, apply every message
//!   commit neighbors
//! ```
//!
//! All mutable state lives in one `parking_lot::Mutex<AgentCore>`.  The lock
//! is held for the synchronous parts of a tick and released while spreading,
//! because posting into a full peer mailbox may wait for that peer's own
//! tick.  Sink calls are collected under the lock and made after it is
//! released, so readers of `position()` / `state()` never wait on a sink.
//!
//! A spreader waiting on a full peer also watches its own mailbox and
//! applies it early if it fills up.  Without that, a ring of contagious
//! agents each blocked on the next one's full mailbox would never drain.
//!
//! A reset bumps `epoch`; a tick that finds the epoch changed after
//! spreading skips its drain so it never applies pre-reset decisions to
//! post-reset state.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{RwLock, watch};
use tracing::{debug, trace, warn};

use ct_core::geo::random_walk;
use ct_core::{AgentId, AgentRng, Arena, DiseaseParams, FrameCounter, Heading, Point, SharedParams, SimParams};

use crate::disease::{self, DiseaseState, Message};
use crate::neighbors::{CommittedNeighbors, NeighborRef, PendingNeighbors};
use crate::sink::{MetricDelta, Sinks, TransitionRecord};
use crate::Mailbox;

// ── AgentCore ─────────────────────────────────────────────────────────────────

/// Everything the agent's own tick mutates.
struct AgentCore {
    position:  Point,
    heading:   Heading,
    state:     DiseaseState,
    /// Day boundaries spent in the current progressing state.
    days:      u32,
    frames:    FrameCounter,
    committed: CommittedNeighbors,
    rng:       AgentRng,
    /// Bumped by every reset.
    epoch:     u64,
}

impl AgentCore {
    fn walk(&mut self, arena: Arena) {
        let (position, heading) = random_walk(self.position, self.heading, arena, &mut self.rng);
        self.position = position;
        self.heading = heading;
    }
}

/// Outcome of the locked part of a day-boundary tick.
struct DayPlan {
    epoch:     u64,
    spread_to: Vec<NeighborRef>,
    reports:   Reports,
}

/// Sink calls gathered under the core lock, made once it is released.
#[derive(Default)]
struct Reports {
    deltas:  Vec<MetricDelta>,
    records: Vec<TransitionRecord>,
}

impl Reports {
    fn flush(self, sinks: &Sinks) {
        for delta in self.deltas {
            sinks.metrics.adjust(delta.bucket, delta.delta);
        }
        for record in self.records {
            sinks.history.record(record);
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// One simulated individual.  Share as `Arc<Agent>`.
///
/// Every public method is safe to call from any thread at any time,
/// including while the agent's own tick is running.
pub struct Agent {
    id:      AgentId,
    mailbox: Arc<Mailbox>,
    pending: PendingNeighbors,
    core:    Mutex<AgentCore>,
}

impl Agent {
    /// Create an agent at `position`, `Infected` if `infected` else
    /// `Vulnerable`.  `seed` is the run's global seed.
    pub fn new(id: AgentId, position: Point, infected: bool, seed: u64) -> Self {
        Self::with_mailbox(id, position, infected, seed, Mailbox::new())
    }

    /// Like [`new`](Self::new) with a caller-supplied mailbox (e.g. a smaller
    /// capacity).
    pub fn with_mailbox(id: AgentId, position: Point, infected: bool, seed: u64, mailbox: Mailbox) -> Self {
        let mut rng = AgentRng::new(seed, id);
        let heading = Heading::random(&mut rng);
        Self {
            id,
            mailbox: Arc::new(mailbox),
            pending: PendingNeighbors::new(),
            core: Mutex::new(AgentCore {
                position,
                heading,
                state:     initial_state(infected),
                days:      0,
                frames:    FrameCounter::ZERO,
                committed: CommittedNeighbors::new(),
                rng,
                epoch:     0,
            }),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Current position.  Both coordinates come from the same tick.
    pub fn position(&self) -> Point {
        self.core.lock().position
    }

    pub fn state(&self) -> DiseaseState {
        self.core.lock().state
    }

    pub fn state_label(&self) -> &'static str {
        self.state().label()
    }

    /// Day boundaries spent in the current incubating / ill state.
    pub fn day_counter(&self) -> u32 {
        self.core.lock().days
    }

    pub fn mailbox_len(&self) -> usize {
        self.mailbox.len()
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    /// IDs in the list the agent currently spreads to.
    pub fn committed_neighbor_ids(&self) -> Vec<AgentId> {
        self.core.lock().committed.ids()
    }

    /// IDs most recently assigned by the controller, not yet committed.
    pub fn pending_neighbor_ids(&self) -> Vec<AgentId> {
        self.pending.ids()
    }

    /// A handle other agents can spread to.
    pub fn neighbor_ref(&self) -> NeighborRef {
        NeighborRef { id: self.id, mailbox: Arc::clone(&self.mailbox) }
    }

    // ── Controller operations ─────────────────────────────────────────────

    /// Replace the pending neighbor buffer.  Takes effect at the end of the
    /// agent's next tick.
    pub fn set_pending_neighbors(&self, neighbors: Vec<NeighborRef>) {
        self.pending.set(neighbors);
    }

    /// Move the agent, e.g. for initial layout.
    pub fn relocate(&self, position: Point) {
        self.core.lock().position = position;
    }

    /// Return to an initial state: `Infected` if `infected` else
    /// `Vulnerable`, empty mailbox, zeroed day and frame counters.
    ///
    /// Atomic with respect to the locked parts of a tick.  Pause the
    /// simulation and wait for in-flight ticks first if no stray `HaveGerms`
    /// from a concurrently spreading neighbor may land afterwards.
    pub fn reset(&self, infected: bool) {
        let mut core = self.core.lock();
        core.state = initial_state(infected);
        core.days = 0;
        core.frames.reset();
        core.epoch += 1;
        self.mailbox.clear();
    }

    /// Apply everything queued right now, outside a tick, and return how many
    /// messages were taken.
    ///
    /// For schedulers that cannot give the owner another tick while a
    /// producer waits on its full mailbox.
    pub fn relieve(&self, sinks: &Sinks) -> usize {
        let mut reports = Reports::default();
        let queued = {
            let mut core = self.core.lock();
            let queued = self.mailbox.len();
            self.drain_into(&mut core, sinks, &mut reports);
            queued
        };
        reports.flush(sinks);
        queued
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Run one tick against the parameter snapshot `params`.
    pub async fn tick(&self, params: &SimParams, sinks: &Sinks) {
        let plan = {
            let mut core = self.core.lock();
            if params.paused {
                core.committed.commit_from(&self.pending);
                return;
            }
            if core.state.is_alive() && params.movement_enabled {
                core.walk(params.arena);
            }
            if !core.frames.advance() {
                core.committed.commit_from(&self.pending);
                return;
            }
            self.plan_day(&mut core, &params.disease, sinks)
        };
        let DayPlan { epoch, spread_to, reports } = plan;
        reports.flush(sinks);

        for neighbor in &spread_to {
            trace!(agent = %self.id, to = %neighbor.id, "spreading germs");
            self.spread_to(neighbor, epoch, sinks).await;
        }

        let mut reports = Reports::default();
        {
            let mut core = self.core.lock();
            if core.epoch == epoch {
                self.drain_into(&mut core, sinks, &mut reports);
            }
            core.committed.commit_from(&self.pending);
        }
        reports.flush(sinks);
    }

    /// Post `HaveGerms` to `neighbor`, waiting while its mailbox is full.
    ///
    /// If our own mailbox fills up meanwhile it is applied on the spot.  Once
    /// a reset has intervened the wait is a plain one.
    async fn spread_to(&self, neighbor: &NeighborRef, epoch: u64, sinks: &Sinks) {
        loop {
            tokio::select! {
                biased;
                _ = neighbor.mailbox.send(Message::HaveGerms) => return,
                _ = self.mailbox.full() => {
                    if !self.relieve_within(epoch, sinks) {
                        neighbor.mailbox.send(Message::HaveGerms).await;
                        return;
                    }
                }
            }
        }
    }

    /// Apply our own queue mid-tick, unless a reset bumped the epoch.
    fn relieve_within(&self, epoch: u64, sinks: &Sinks) -> bool {
        let mut reports = Reports::default();
        {
            let mut core = self.core.lock();
            if core.epoch != epoch {
                return false;
            }
            debug!(agent = %self.id, queued = self.mailbox.len(), "own mailbox full while spreading, applying it");
            self.drain_into(&mut core, sinks, &mut reports);
        }
        reports.flush(sinks);
        true
    }

    /// Daily progression decisions.  Self-posts at most one transition and
    /// returns the neighbors chosen to receive germs.
    fn plan_day(&self, core: &mut AgentCore, disease: &DiseaseParams, sinks: &Sinks) -> DayPlan {
        let state = core.state;
        let mut contagious = state.is_contagious();
        let mut reports = Reports::default();

        match state {
            DiseaseState::Infected => {
                core.days += 1;
                if f64::from(core.days) >= disease.incubation_days {
                    let sick = core.rng.chance(disease.sickness_probability);
                    self.post_self(core, disease::incubation_outcome(sick), sinks, &mut reports);
                    core.days = 0;
                    // Symptoms decided today: contagious for today's spread.
                    contagious = true;
                }
            }
            DiseaseState::Sick | DiseaseState::Asymptomatic => {
                core.days += 1;
                if f64::from(core.days) >= disease.illness_days {
                    let dies = state == DiseaseState::Sick && core.rng.chance(disease.death_probability);
                    if let Some((message, leaving)) = disease::illness_outcome(state, dies) {
                        reports.deltas.push(leaving);
                        self.post_self(core, message, sinks, &mut reports);
                    }
                    core.days = 0;
                }
            }
            _ => {}
        }

        let spread_to = if contagious {
            let p = disease.spread_probability;
            let rng = &mut core.rng;
            core.committed
                .iter()
                .filter(|n| n.id != self.id)
                .filter(|_| rng.chance(p))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        DayPlan { epoch: core.epoch, spread_to, reports }
    }

    /// Post a transition request to our own mailbox.
    ///
    /// The owner never waits on itself: if the mailbox is saturated the
    /// queued messages are applied first to make room.
    fn post_self(&self, core: &mut AgentCore, message: Message, sinks: &Sinks, reports: &mut Reports) {
        while self.mailbox.try_send(message).is_err() {
            warn!(agent = %self.id, ?message, "own mailbox saturated, draining before self-post");
            self.drain_into(core, sinks, reports);
        }
    }

    /// Apply every message queued right now.  `sinks` only supplies the day
    /// stamp; what to report is appended to `reports`.
    fn drain_into(&self, core: &mut AgentCore, sinks: &Sinks, reports: &mut Reports) {
        let messages = self.mailbox.drain();
        if messages.is_empty() {
            return;
        }
        let day = sinks.history.current_day();
        for message in messages {
            let Some(applied) = disease::apply(core.state, message) else {
                continue;
            };
            core.state = applied.next;
            core.days = 0;
            reports.deltas.extend_from_slice(applied.metrics);
            reports.records.push(TransitionRecord { agent: self.id, state: applied.next, day });
            debug!(agent = %self.id, state = applied.next.label(), day = day.0, "transition");
        }
    }

    // ── Task loop ─────────────────────────────────────────────────────────

    /// The agent's unbounded loop: wait one tick interval, tick, repeat.
    ///
    /// Each tick runs under a read guard of `ctx.gate`, so a controller
    /// holding the write guard knows no tick is in flight.  Returns when the
    /// shutdown signal flips to `true` or its sender is dropped.
    ///
    /// A tick stuck waiting on a full peer mailbox is abandoned at that
    /// await.  By then it may have reported an agent leaving `Sick` or
    /// `Asymptomatic` and self-posted the outcome, so the queue is applied
    /// once more before returning and the population totals still add up.
    pub async fn run(self: Arc<Self>, mut ctx: TaskContext) {
        loop {
            let interval = ctx.params.snapshot().tick_interval;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = stopped(&mut ctx.shutdown) => break,
            }

            let _guard = ctx.gate.read().await;
            let params = ctx.params.snapshot();
            tokio::select! {
                _ = self.tick(&params, &ctx.sinks) => {}
                _ = stopped(&mut ctx.shutdown) => {
                    let applied = self.relieve(&ctx.sinks);
                    debug!(agent = %self.id, applied, "tick cut short by shutdown");
                    break;
                }
            }
        }
        debug!(agent = %self.id, "agent task stopped");
    }
}

/// Resolves once shutdown is requested or the controller is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// What an agent task needs besides the agent itself.
#[derive(Clone)]
pub struct TaskContext {
    pub params:   Arc<SharedParams>,
    pub sinks:    Sinks,
    /// Held for reading by every tick; taken for writing to quiesce.
    pub gate:     Arc<RwLock<()>>,
    pub shutdown: watch::Receiver<bool>,
}

fn initial_state(infected: bool) -> DiseaseState {
    if infected {
        DiseaseState::Infected
    } else {
        DiseaseState::Vulnerable
    }
}
