//! `Simulation` — the live runtime.
//!
//! # Tasks
//!
//! ```text
//! start(population, observer):
//!   one task per agent      loop { sleep(tick_interval); tick }        (Agent::run)
//!   day clock               loop { sleep(day_length); if !paused: end_day }
//!   neighbor refresher      every neighbor_refresh: recompute adjacency
//! ```
//!
//! There is no global barrier: every task sleeps on its own clock.  All of
//! them watch one shutdown channel and leave their loop as soon as it flips.
//!
//! # Reset
//!
//! Agent ticks run under read guards of a shared tick gate.  `reset`:
//!
//! 1. pauses, remembering the previous pause flag;
//! 2. clears every mailbox (releasing producers waiting on a full one) until
//!    it holds the gate's write guard, i.e. no tick is in flight;
//! 3. resets the population (agents, mailboxes, stats, history, day);
//! 4. restores the pause flag and releases the gate.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use ct_agent::TaskContext;
use ct_core::{SharedParams, SimDay};

use crate::{BucketCounts, Census, HistoryLog, Population, PopulationStats, SimObserver, SimResult};

/// How long `reset` waits for the tick gate before clearing mailboxes again.
const QUIESCE_RETRY: Duration = Duration::from_millis(10);

pub struct Simulation {
    population: Arc<Population>,
    gate:       Arc<RwLock<()>>,
    shutdown:   watch::Sender<bool>,
    tasks:      Vec<JoinHandle<()>>,
}

impl Simulation {
    /// Spawn every task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(population: Population, observer: Arc<dyn SimObserver>) -> Self {
        population.set_observer(observer);
        let population = Arc::new(population);
        let gate = Arc::new(RwLock::new(()));
        let (shutdown, rx) = watch::channel(false);

        let ctx = TaskContext {
            params:   Arc::clone(population.params()),
            sinks:    population.sinks().clone(),
            gate:     Arc::clone(&gate),
            shutdown: rx.clone(),
        };
        let mut tasks: Vec<JoinHandle<()>> = population
            .agents()
            .iter()
            .map(|agent| tokio::spawn(Arc::clone(agent).run(ctx.clone())))
            .collect();

        tasks.push(tokio::spawn(day_clock(Arc::clone(&population), rx.clone())));
        let config = population.config();
        tasks.push(tokio::spawn(neighbor_refresher(
            Arc::clone(&population),
            config.neighbor_refresh(),
            config.contact_radius,
            rx,
        )));

        info!(agents = population.len(), "simulation started");
        Self { population, gate, shutdown, tasks }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn population(&self) -> &Arc<Population> {
        &self.population
    }

    pub fn params(&self) -> &Arc<SharedParams> {
        self.population.params()
    }

    pub fn stats(&self) -> &Arc<PopulationStats> {
        self.population.stats()
    }

    pub fn counts(&self) -> BucketCounts {
        self.population.stats().snapshot()
    }

    pub fn history(&self) -> &Arc<HistoryLog> {
        self.population.history()
    }

    pub fn census(&self) -> Census {
        self.population.census()
    }

    pub fn current_day(&self) -> SimDay {
        self.population.current_day()
    }

    // ── Control ───────────────────────────────────────────────────────────

    pub fn pause(&self) {
        if !self.params().set_paused(true) {
            info!(day = self.current_day().0, "simulation paused");
        }
    }

    pub fn resume(&self) {
        if self.params().set_paused(false) {
            info!(day = self.current_day().0, "simulation resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.params().is_paused()
    }

    pub fn set_movement(&self, enabled: bool) {
        self.params().set_movement_enabled(enabled);
    }

    /// Restart the epidemic with `initially_infected` random agents infected.
    /// Returns once no pre-reset tick can still touch any agent.
    pub async fn reset(&self, initially_infected: usize) -> SimResult<()> {
        let population = &self.population;
        population.check_infected_count(initially_infected)?;

        let was_paused = population.params().set_paused(true);
        let quiet = loop {
            population.clear_mailboxes();
            match tokio::time::timeout(QUIESCE_RETRY, self.gate.write()).await {
                Ok(guard) => break guard,
                Err(_) => debug!("reset waiting for in-flight ticks"),
            }
        };
        let result = population.reset(initially_infected);
        population.params().set_paused(was_paused);
        drop(quiet);

        result?;
        info!(initially_infected, "simulation reset");
        Ok(())
    }

    /// Stop every task, wait for them, and report the final day.
    pub async fn shutdown(mut self) -> SimResult<SimDay> {
        self.shutdown.send_replace(true);
        let mut first_error = None;
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "task ended abnormally");
                first_error.get_or_insert(e);
            }
        }
        let day = self.population.finish();
        info!(day = day.0, "simulation shut down");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(day),
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

// ── Controller tasks ──────────────────────────────────────────────────────────

async fn day_clock(population: Arc<Population>, mut shutdown: watch::Receiver<bool>) {
    loop {
        let length = population.params().snapshot().day_length();
        tokio::select! {
            _ = tokio::time::sleep(length) => {}
            _ = stopped(&mut shutdown) => break,
        }
        if !population.params().is_paused() {
            population.end_day();
        }
    }
    debug!("day clock stopped");
}

async fn neighbor_refresher(
    population: Arc<Population>,
    every:      Duration,
    radius:     f64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stopped(&mut shutdown) => break,
        }
        if let Err(e) = population.refresh_neighbors(radius) {
            warn!(error = %e, "neighbor refresh failed");
        }
    }
    debug!("neighbor refresher stopped");
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
