//! `Population` — every agent plus the controller-side state they report to.
//!
//! A population can be driven two ways:
//!
//! | Driver                     | Scheduling                                        |
//! |----------------------------|---------------------------------------------------|
//! | [`Population::run_days`]   | virtual: one tick of every agent per step, in ID order |
//! | [`Simulation`](crate::Simulation) | live: one tokio task per agent, wall-clock ticks |
//!
//! The virtual scheduler is deterministic for a given seed.  It polls all
//! tick futures of a step in ID order: a tick that never waits finishes
//! before the next agent's tick begins, and a tick waiting on a saturated
//! peer mailbox yields so the peer can drain.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Context;

use futures::task::{ArcWake, waker};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use ct_agent::{Agent, HistorySink, Mailbox, MAILBOX_CAPACITY, Sinks};
use ct_core::{AgentId, FRAMES_PER_DAY, Point, SharedParams, SimDay, SimRng};
use ct_spatial::{GridLayout, ProximityIndex, random_positions};

use crate::config::Layout;
use crate::{Census, HistoryLog, PopulationStats, SimConfig, SimError, SimObserver, SimResult};

/// Records that some tick of the current step was woken.
struct WakeFlag(AtomicBool);

impl ArcWake for WakeFlag {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.store(true, Ordering::Release);
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`Population`].
///
/// # Optional inputs (have defaults)
///
/// | Method                  | Default                                        |
/// |-------------------------|------------------------------------------------|
/// | `.positions(v)`         | generated from `config.layout`                 |
/// | `.infected(ids)`        | `config.initially_infected` agents chosen at random |
/// | `.mailbox_capacity(n)`  | `MAILBOX_CAPACITY`                             |
/// | `.observer(o)`          | `NoopObserver`                                 |
pub struct PopulationBuilder {
    config:           SimConfig,
    positions:        Option<Vec<Point>>,
    infected:         Option<Vec<AgentId>>,
    mailbox_capacity: usize,
    observer:         Option<Arc<dyn SimObserver>>,
}

impl PopulationBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            positions:        None,
            infected:         None,
            mailbox_capacity: MAILBOX_CAPACITY,
            observer:         None,
        }
    }

    /// Explicit start positions (must be length `agent_count`).
    pub fn positions(mut self, positions: Vec<Point>) -> Self {
        self.positions = Some(positions);
        self
    }

    /// Explicit initially infected agents, replacing the random choice.
    pub fn infected(mut self, ids: Vec<AgentId>) -> Self {
        self.infected = Some(ids);
        self
    }

    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SimObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validate all inputs and create the agents.  Neighbor lists are
    /// computed once from the start positions before returning.
    pub fn build(self) -> SimResult<Population> {
        let config = self.config;
        config.validate()?;
        let n = config.agent_count;
        let params = Arc::new(SharedParams::new(config.sim_params())?);
        let arena = params.snapshot().arena;
        let mut rng = SimRng::new(config.seed);

        let positions = match self.positions {
            Some(v) if v.len() != n => {
                return Err(SimError::AgentCountMismatch { expected: n, got: v.len(), what: "positions" });
            }
            Some(v) => v,
            None => match config.layout {
                Layout::Grid => GridLayout::square_for(n, arena).positions(n)?,
                Layout::Jittered => GridLayout::square_for(n, arena).jittered_positions(n, &mut rng)?,
                Layout::Random => random_positions(n, arena, &mut rng),
            },
        };

        let mut infected = vec![false; n];
        match self.infected {
            Some(ids) => {
                for id in ids {
                    *infected.get_mut(id.index()).ok_or(SimError::AgentNotFound(id))? = true;
                }
            }
            None => {
                for i in rng.sample_indices(n, config.initially_infected) {
                    infected[i] = true;
                }
            }
        }

        let agents: Vec<Arc<Agent>> = positions
            .into_iter()
            .zip(&infected)
            .enumerate()
            .map(|(i, (pos, &sick))| {
                let mailbox = Mailbox::with_capacity(self.mailbox_capacity);
                Arc::new(Agent::with_mailbox(AgentId(i as u32), pos, sick, config.seed, mailbox))
            })
            .collect();

        let stats = Arc::new(PopulationStats::new(n));
        let history = Arc::new(HistoryLog::new(config.history_capacity));
        if let Some(observer) = self.observer {
            history.set_observer(observer);
        }
        let sinks = Sinks::new(stats.clone(), history.clone());

        let population = Population {
            agents,
            params,
            stats,
            history,
            sinks,
            rng: Mutex::new(rng),
            config,
        };
        population.refresh_neighbors(population.config.contact_radius)?;
        info!(
            agents = n,
            infected = infected.iter().filter(|&&i| i).count(),
            seed = population.config.seed,
            "population built"
        );
        Ok(population)
    }
}

// ── Population ────────────────────────────────────────────────────────────────

pub struct Population {
    agents:  Vec<Arc<Agent>>,
    params:  Arc<SharedParams>,
    stats:   Arc<PopulationStats>,
    history: Arc<HistoryLog>,
    sinks:   Sinks,
    /// Chooses who is infected again after a reset.
    rng:     Mutex<SimRng>,
    config:  SimConfig,
}

impl Population {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> SimResult<&Arc<Agent>> {
        self.agents.get(id.index()).ok_or(SimError::AgentNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn params(&self) -> &Arc<SharedParams> {
        &self.params
    }

    pub fn stats(&self) -> &Arc<PopulationStats> {
        &self.stats
    }

    pub fn history(&self) -> &Arc<HistoryLog> {
        &self.history
    }

    pub fn sinks(&self) -> &Sinks {
        &self.sinks
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn current_day(&self) -> SimDay {
        self.history.current_day()
    }

    pub fn set_observer(&self, observer: Arc<dyn SimObserver>) {
        self.history.set_observer(observer);
    }

    pub fn positions(&self) -> Vec<Point> {
        self.agents.iter().map(|a| a.position()).collect()
    }

    pub fn census(&self) -> Census {
        Census::of(self.agents.iter().map(|a| a.state()))
    }

    // ── Neighbors ─────────────────────────────────────────────────────────

    /// Recompute who is within `radius` of whom from current positions and
    /// hand every agent its new pending neighbor list.
    pub fn refresh_neighbors(&self, radius: f64) -> SimResult<()> {
        let index = ProximityIndex::build(&self.positions())?;
        let rows = index.adjacency(radius)?;
        for (agent, row) in self.agents.iter().zip(rows) {
            let refs = row.iter().map(|id| self.agents[id.index()].neighbor_ref()).collect();
            agent.set_pending_neighbors(refs);
        }
        Ok(())
    }

    /// Assign `neighbors` as `id`'s pending neighbor list.
    pub fn set_neighbors(&self, id: AgentId, neighbors: &[AgentId]) -> SimResult<()> {
        let agent = self.agent(id)?;
        let refs = neighbors
            .iter()
            .map(|&n| self.agent(n).map(|a| a.neighbor_ref()))
            .collect::<SimResult<Vec<_>>>()?;
        agent.set_pending_neighbors(refs);
        Ok(())
    }

    // ── Virtual scheduler ─────────────────────────────────────────────────

    /// One tick of every agent against a single parameter snapshot.
    ///
    /// Ticks are polled round-robin in ID order until all complete.  If a
    /// whole round passes with every remaining tick waiting and nothing
    /// woken, those ticks are waiting on mailboxes whose owners already
    /// ticked this step; the full mailboxes are relieved early, as their
    /// owners' next ticks would in a live run.
    pub async fn step_all(&self) {
        let params = self.params.snapshot();
        let mut ticks: Vec<_> = self
            .agents
            .iter()
            .map(|a| Some(Box::pin(a.tick(&params, &self.sinks))))
            .collect();

        let flag = Arc::new(WakeFlag(AtomicBool::new(false)));
        let flag_waker = waker(Arc::clone(&flag));
        let mut cx = Context::from_waker(&flag_waker);

        loop {
            flag.0.store(false, Ordering::Release);
            let mut waiting = 0;
            for slot in &mut ticks {
                if let Some(tick) = slot {
                    if tick.as_mut().poll(&mut cx).is_ready() {
                        *slot = None;
                    } else {
                        waiting += 1;
                    }
                }
            }
            if waiting == 0 {
                break;
            }
            if flag.0.load(Ordering::Acquire) {
                continue;
            }
            if self.relieve_full_mailboxes() == 0 {
                warn!(waiting, "virtual step stalled with no full mailbox, abandoning ticks");
                break;
            }
        }
    }

    fn relieve_full_mailboxes(&self) -> usize {
        let mut relieved = 0;
        for agent in self.agents.iter().filter(|a| a.mailbox().is_full()) {
            let taken = agent.relieve(&self.sinks);
            debug!(agent = %agent.id(), taken, "relieved saturated mailbox");
            relieved += 1;
        }
        relieved
    }

    /// Run `days` simulated days and return the current day afterwards.
    ///
    /// The day counter only advances for days that ran unpaused.
    pub async fn run_days(&self, days: u64) -> SimDay {
        for _ in 0..days {
            for _ in 0..FRAMES_PER_DAY {
                self.step_all().await;
            }
            if !self.params.is_paused() {
                self.end_day();
            }
        }
        self.current_day()
    }

    /// Close the current day: advance the counter and notify the observer.
    /// Returns the day that ended.
    pub fn end_day(&self) -> SimDay {
        let ended = self.current_day();
        self.history.advance_day();
        let counts = self.stats.snapshot();
        info!(
            day = ended.0,
            vulnerable = counts.vulnerable,
            sick = counts.sick,
            asymptomatic = counts.asymptomatic,
            immune = counts.immune,
            dead = counts.dead,
            "day ended"
        );
        self.history.observer().on_day_end(ended, &counts);
        ended
    }

    /// Report the end of a run to the observer.
    pub fn finish(&self) -> SimDay {
        let day = self.current_day();
        self.history.observer().on_shutdown(day);
        day
    }

    // ── Reset ─────────────────────────────────────────────────────────────

    /// Discard every queued message in every mailbox.
    pub fn clear_mailboxes(&self) {
        for agent in &self.agents {
            agent.mailbox().clear();
        }
    }

    /// Return every agent to `Vulnerable`, then infect `initially_infected`
    /// agents chosen at random.  Counters, history, and the day go back to
    /// zero.
    ///
    /// With no tasks running this is safe as is; a live
    /// [`Simulation`](crate::Simulation) quiesces its tasks first.
    pub fn reset(&self, initially_infected: usize) -> SimResult<()> {
        self.check_infected_count(initially_infected)?;
        let picked = self.rng.lock().sample_indices(self.len(), initially_infected);
        let mut picked = picked.into_iter().peekable();
        for (i, agent) in self.agents.iter().enumerate() {
            let infected = picked.next_if_eq(&i).is_some();
            agent.reset(infected);
        }
        self.clear_mailboxes();
        self.stats.reset();
        self.history.reset();
        debug!(initially_infected, "population reset");
        Ok(())
    }

    pub(crate) fn check_infected_count(&self, initially_infected: usize) -> SimResult<()> {
        if initially_infected > self.len() {
            return Err(SimError::Config(format!(
                "cannot infect {initially_infected} of {} agents",
                self.len()
            )));
        }
        Ok(())
    }
}
