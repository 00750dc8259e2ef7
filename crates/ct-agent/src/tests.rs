//! Unit tests for ct-agent.

use std::sync::Arc;

use parking_lot::Mutex;

use ct_core::{AgentId, DiseaseParams, FRAMES_PER_DAY, Point, SimDay, SimParams};

use crate::{Agent, Bucket, HistorySink, MetricsSink, Sinks, TransitionRecord};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Sink pair that remembers everything it was told.
#[derive(Default)]
struct Recorder {
    deltas:      Mutex<Vec<(Bucket, i64)>>,
    transitions: Mutex<Vec<TransitionRecord>>,
}

impl MetricsSink for Recorder {
    fn adjust(&self, bucket: Bucket, delta: i64) {
        self.deltas.lock().push((bucket, delta));
    }
}

impl HistorySink for Recorder {
    fn record(&self, record: TransitionRecord) {
        self.transitions.lock().push(record);
    }

    fn current_day(&self) -> SimDay {
        SimDay(7)
    }
}

impl Recorder {
    fn sinks(self: &Arc<Self>) -> Sinks {
        Sinks::new(self.clone(), self.clone())
    }

    fn net(&self, bucket: Bucket) -> i64 {
        self.deltas.lock().iter().filter(|(b, _)| *b == bucket).map(|(_, d)| d).sum()
    }
}

fn disease(spread: f64, sick: f64, death: f64, incubation: f64, illness: f64) -> DiseaseParams {
    DiseaseParams {
        spread_probability:   spread,
        sickness_probability: sick,
        death_probability:    death,
        incubation_days:      incubation,
        illness_days:         illness,
    }
}

fn still(disease: DiseaseParams) -> SimParams {
    SimParams { disease, movement_enabled: false, ..SimParams::default() }
}

fn agent(id: u32, infected: bool) -> Arc<Agent> {
    Arc::new(Agent::new(AgentId(id), Point::new(50.0, 50.0), infected, 42))
}

/// Make every agent in `group` a neighbor of every other, committed.
async fn link_all(group: &[Arc<Agent>], sinks: &Sinks) {
    let paused = SimParams { paused: true, ..SimParams::default() };
    for a in group {
        let refs = group.iter().filter(|b| b.id() != a.id()).map(|b| b.neighbor_ref()).collect();
        a.set_pending_neighbors(refs);
        a.tick(&paused, sinks).await;
    }
}

/// One simulated day of every agent, in ID order.
async fn run_day(group: &[Arc<Agent>], params: &SimParams, sinks: &Sinks) {
    for _ in 0..FRAMES_PER_DAY {
        for a in group {
            a.tick(params, sinks).await;
        }
    }
}

// ── Disease table ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod disease_tests {
    use crate::disease::{apply, illness_outcome, incubation_outcome};
    use crate::{Bucket, DiseaseState, Message, MetricDelta};

    #[test]
    fn have_germs_only_infects_vulnerable() {
        let applied = apply(DiseaseState::Vulnerable, Message::HaveGerms).unwrap();
        assert_eq!(applied.next, DiseaseState::Infected);
        assert!(applied.metrics.is_empty());

        for state in [
            DiseaseState::Infected,
            DiseaseState::Asymptomatic,
            DiseaseState::Sick,
            DiseaseState::Immune,
            DiseaseState::Dead,
        ] {
            assert_eq!(apply(state, Message::HaveGerms), None, "{state}");
        }
    }

    #[test]
    fn become_messages_report_metrics() {
        let sick = apply(DiseaseState::Infected, Message::BecomeSick).unwrap();
        assert_eq!(sick.next, DiseaseState::Sick);
        assert_eq!(
            sick.metrics,
            [MetricDelta::new(Bucket::Sick, 1), MetricDelta::new(Bucket::Vulnerable, -1)]
        );

        let asym = apply(DiseaseState::Infected, Message::BecomeAsymptomatic).unwrap();
        assert_eq!(asym.next, DiseaseState::Asymptomatic);
        assert_eq!(
            asym.metrics,
            [MetricDelta::new(Bucket::Asymptomatic, 1), MetricDelta::new(Bucket::Vulnerable, -1)]
        );

        let immune = apply(DiseaseState::Sick, Message::BecomeImmune).unwrap();
        assert_eq!(immune.next, DiseaseState::Immune);
        assert_eq!(immune.metrics, [MetricDelta::new(Bucket::Immune, 1)]);

        let dead = apply(DiseaseState::Sick, Message::BecomeDead).unwrap();
        assert_eq!(dead.next, DiseaseState::Dead);
        assert_eq!(dead.metrics, [MetricDelta::new(Bucket::Dead, 1)]);
    }

    #[test]
    fn terminal_states_absorb_everything() {
        for state in [DiseaseState::Immune, DiseaseState::Dead] {
            for msg in [
                Message::HaveGerms,
                Message::BecomeSick,
                Message::BecomeAsymptomatic,
                Message::BecomeImmune,
                Message::BecomeDead,
            ] {
                assert_eq!(apply(state, msg), None, "{state} / {msg:?}");
            }
        }
    }

    #[test]
    fn outcomes() {
        assert_eq!(incubation_outcome(true), Message::BecomeSick);
        assert_eq!(incubation_outcome(false), Message::BecomeAsymptomatic);

        assert_eq!(
            illness_outcome(DiseaseState::Sick, true),
            Some((Message::BecomeDead, MetricDelta::new(Bucket::Sick, -1)))
        );
        assert_eq!(
            illness_outcome(DiseaseState::Sick, false),
            Some((Message::BecomeImmune, MetricDelta::new(Bucket::Sick, -1)))
        );
        // Asymptomatic agents always recover.
        assert_eq!(
            illness_outcome(DiseaseState::Asymptomatic, true),
            Some((Message::BecomeImmune, MetricDelta::new(Bucket::Asymptomatic, -1)))
        );
        assert_eq!(illness_outcome(DiseaseState::Infected, true), None);
    }

    #[test]
    fn labels() {
        let labels: Vec<_> = DiseaseState::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, ["vulnerable", "infected", "asymptomatic", "sick", "immune", "dead"]);
        assert!(DiseaseState::Immune.is_terminal());
        assert!(DiseaseState::Asymptomatic.is_contagious());
        assert!(!DiseaseState::Dead.is_alive());
    }
}

// ── Mailbox ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod mailbox_tests {
    use std::sync::Arc;

    use crate::{MAILBOX_CAPACITY, Mailbox, MailboxFull, Message};

    #[test]
    fn default_capacity() {
        assert_eq!(Mailbox::new().capacity(), MAILBOX_CAPACITY);
        assert_eq!(Mailbox::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn try_send_hands_back_on_full() {
        let mb = Mailbox::with_capacity(2);
        mb.try_send(Message::HaveGerms).unwrap();
        mb.try_send(Message::BecomeSick).unwrap();
        assert!(mb.is_full());
        assert_eq!(mb.try_send(Message::BecomeDead), Err(MailboxFull(Message::BecomeDead)));
        assert_eq!(mb.len(), 2);
    }

    #[test]
    fn drain_takes_everything_in_order() {
        let mb = Mailbox::new();
        mb.try_send(Message::HaveGerms).unwrap();
        mb.try_send(Message::BecomeSick).unwrap();
        mb.try_send(Message::HaveGerms).unwrap();
        assert_eq!(mb.drain(), [Message::HaveGerms, Message::BecomeSick, Message::HaveGerms]);
        assert!(mb.is_empty());

        // Later arrivals are kept for the next drain.
        mb.try_send(Message::BecomeImmune).unwrap();
        assert_eq!(mb.drain(), [Message::BecomeImmune]);
        assert!(mb.drain().is_empty());
    }

    #[tokio::test]
    async fn send_waits_for_drain() {
        let mb = Arc::new(Mailbox::with_capacity(1));
        mb.try_send(Message::HaveGerms).unwrap();

        let producer = {
            let mb = Arc::clone(&mb);
            tokio::spawn(async move { mb.send(Message::BecomeSick).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!producer.is_finished(), "producer must wait while full");
        assert_eq!(mb.len(), 1);

        assert_eq!(mb.drain(), [Message::HaveGerms]);
        producer.await.unwrap();
        assert_eq!(mb.drain(), [Message::BecomeSick]);
    }

    #[tokio::test]
    async fn clear_releases_waiting_producer() {
        let mb = Arc::new(Mailbox::with_capacity(1));
        mb.try_send(Message::HaveGerms).unwrap();
        let producer = {
            let mb = Arc::clone(&mb);
            tokio::spawn(async move { mb.send(Message::HaveGerms).await })
        };
        tokio::task::yield_now().await;
        mb.clear();
        producer.await.unwrap();
        assert_eq!(mb.len(), 1);
    }

    #[tokio::test]
    async fn send_with_room_does_not_wait() {
        let mb = Mailbox::new();
        for _ in 0..MAILBOX_CAPACITY {
            mb.send(Message::HaveGerms).await;
        }
        assert!(mb.is_full());
    }
}

// ── Neighbor buffers ──────────────────────────────────────────────────────────

#[cfg(test)]
mod neighbor_tests {
    use std::sync::Arc;

    use ct_core::AgentId;

    use crate::{CommittedNeighbors, Mailbox, NeighborRef, PendingNeighbors};

    fn nref(id: u32) -> NeighborRef {
        NeighborRef { id: AgentId(id), mailbox: Arc::new(Mailbox::new()) }
    }

    #[test]
    fn commit_copies_pending_wholesale() {
        let pending = PendingNeighbors::new();
        let mut committed = CommittedNeighbors::new();
        pending.set(vec![nref(1), nref(2)]);
        assert!(committed.is_empty());

        committed.commit_from(&pending);
        assert_eq!(committed.ids(), [AgentId(1), AgentId(2)]);

        pending.set(vec![nref(3)]);
        // Not visible until the next commit.
        assert_eq!(committed.len(), 2);
        committed.commit_from(&pending);
        assert_eq!(committed.ids(), [AgentId(3)]);
    }

    #[test]
    fn repeated_commits_are_idempotent() {
        let pending = PendingNeighbors::new();
        let mut committed = CommittedNeighbors::new();
        pending.set(vec![nref(4), nref(5), nref(6)]);
        for _ in 0..10 {
            committed.commit_from(&pending);
            assert_eq!(committed.ids(), pending.ids());
        }
    }
}

// ── Agent execution unit ──────────────────────────────────────────────────────

#[cfg(test)]
mod agent_tests {
    use tokio::sync::{RwLock, watch};

    use ct_core::SharedParams;

    use super::*;
    use crate::{DiseaseState, Mailbox, Message, TaskContext};

    #[tokio::test]
    async fn many_germs_one_infection() {
        let rec = Arc::new(Recorder::default());
        let sinks = rec.sinks();
        let a = agent(0, false);
        for _ in 0..3 {
            a.mailbox().try_send(Message::HaveGerms).unwrap();
        }
        run_day(&[a.clone()], &still(disease(0.0, 1.0, 0.0, 5.0, 5.0)), &sinks).await;

        assert_eq!(a.state(), DiseaseState::Infected);
        assert_eq!(a.mailbox_len(), 0);
        let history = rec.transitions.lock().clone();
        assert_eq!(
            history,
            [TransitionRecord { agent: AgentId(0), state: DiseaseState::Infected, day: SimDay(7) }]
        );
    }

    #[tokio::test]
    async fn drain_only_on_day_boundary() {
        let sinks = Sinks::noop();
        let a = agent(0, false);
        let params = still(DiseaseParams::default());
        a.mailbox().try_send(Message::HaveGerms).unwrap();
        for _ in 0..FRAMES_PER_DAY - 1 {
            a.tick(&params, &sinks).await;
            assert_eq!(a.state(), DiseaseState::Vulnerable);
        }
        a.tick(&params, &sinks).await;
        assert_eq!(a.state(), DiseaseState::Infected);
    }

    #[tokio::test]
    async fn incubation_ends_in_exactly_one_outcome() {
        for (sick_p, expected) in [(1.0, DiseaseState::Sick), (0.0, DiseaseState::Asymptomatic)] {
            let rec = Arc::new(Recorder::default());
            let sinks = rec.sinks();
            let a = agent(0, true);
            let params = still(disease(0.0, sick_p, 0.0, 2.0, 50.0));

            run_day(&[a.clone()], &params, &sinks).await;
            assert_eq!(a.state(), DiseaseState::Infected);
            assert_eq!(a.day_counter(), 1);

            run_day(&[a.clone()], &params, &sinks).await;
            assert_eq!(a.state(), expected);
            assert_eq!(a.day_counter(), 0);
            assert_eq!(rec.transitions.lock().len(), 1);
            assert_eq!(rec.net(Bucket::Vulnerable), -1);
        }
    }

    #[tokio::test]
    async fn sick_agent_dies_after_illness_days_and_stays_dead() {
        let rec = Arc::new(Recorder::default());
        let sinks = rec.sinks();
        let a = agent(0, true);
        let params = still(disease(0.0, 1.0, 1.0, 1.0, 3.0));

        run_day(&[a.clone()], &params, &sinks).await;
        assert_eq!(a.state(), DiseaseState::Sick);

        for day in 1..=2 {
            run_day(&[a.clone()], &params, &sinks).await;
            assert_eq!(a.state(), DiseaseState::Sick, "day {day}");
        }
        run_day(&[a.clone()], &params, &sinks).await;
        assert_eq!(a.state(), DiseaseState::Dead);

        let pos = a.position();
        let moving = SimParams { movement_enabled: true, ..params };
        for _ in 0..20 {
            run_day(&[a.clone()], &moving, &sinks).await;
            assert_eq!(a.state(), DiseaseState::Dead);
        }
        assert_eq!(a.position(), pos, "the dead do not walk");
        assert_eq!(rec.net(Bucket::Sick), 0);
        assert_eq!(rec.net(Bucket::Dead), 1);
    }

    #[tokio::test]
    async fn asymptomatic_always_recovers() {
        let rec = Arc::new(Recorder::default());
        let sinks = rec.sinks();
        let a = agent(0, true);
        let params = still(disease(0.0, 0.0, 1.0, 1.0, 2.0));
        for _ in 0..3 {
            run_day(&[a.clone()], &params, &sinks).await;
        }
        assert_eq!(a.state(), DiseaseState::Immune);
        assert_eq!(rec.net(Bucket::Asymptomatic), 0);
        assert_eq!(rec.net(Bucket::Immune), 1);
        assert_eq!(rec.net(Bucket::Vulnerable), -1);
    }

    #[tokio::test]
    async fn death_frequency_tracks_probability() {
        let rec = Arc::new(Recorder::default());
        let sinks = rec.sinks();
        let group: Vec<_> = (0..2_000).map(|i| agent(i, true)).collect();
        let params = still(disease(0.0, 1.0, 0.3, 1.0, 1.0));
        run_day(&group, &params, &sinks).await;
        run_day(&group, &params, &sinks).await;

        let dead = group.iter().filter(|a| a.state() == DiseaseState::Dead).count();
        let immune = group.iter().filter(|a| a.state() == DiseaseState::Immune).count();
        assert_eq!(dead + immune, group.len(), "every sick agent resolves exactly once");
        let freq = dead as f64 / group.len() as f64;
        assert!((freq - 0.3).abs() < 0.04, "death frequency {freq}");
    }

    #[tokio::test]
    async fn zero_spread_never_infects() {
        let sinks = Sinks::noop();
        let group = vec![agent(0, true), agent(1, false), agent(2, false)];
        link_all(&group, &sinks).await;
        let params = still(disease(0.0, 1.0, 0.0, 1.0, 30.0));
        for _ in 0..20 {
            run_day(&group, &params, &sinks).await;
        }
        assert_eq!(group[0].state(), DiseaseState::Sick);
        assert_eq!(group[1].state(), DiseaseState::Vulnerable);
        assert_eq!(group[2].state(), DiseaseState::Vulnerable);
    }

    #[tokio::test]
    async fn full_spread_infects_every_vulnerable_neighbor() {
        let sinks = Sinks::noop();
        let group: Vec<_> = (0..5).map(|i| agent(i, i == 0)).collect();
        link_all(&group, &sinks).await;
        let params = still(disease(1.0, 1.0, 0.0, 1.0, 30.0));

        run_day(&group, &params, &sinks).await;
        assert_eq!(group[0].state(), DiseaseState::Sick);
        for a in &group[1..] {
            assert_eq!(a.state(), DiseaseState::Infected, "{}", a.id());
        }
    }

    #[tokio::test]
    async fn two_agent_scenario() {
        let sinks = Sinks::noop();
        let group = vec![agent(0, true), agent(1, false)];
        link_all(&group, &sinks).await;
        let params = still(disease(1.0, 1.0, 0.0, 1.0, 1.0));

        run_day(&group, &params, &sinks).await;
        assert_eq!(group[0].state(), DiseaseState::Sick);
        assert_eq!(group[1].state(), DiseaseState::Infected);

        run_day(&group, &params, &sinks).await;
        assert_eq!(group[0].state(), DiseaseState::Immune);
        assert_eq!(group[1].state(), DiseaseState::Sick);
    }

    #[tokio::test]
    async fn paused_agent_only_commits_neighbors() {
        let sinks = Sinks::noop();
        let a = agent(0, true);
        let b = agent(1, false);
        let paused = SimParams { paused: true, ..SimParams::default() };
        let start = a.position();

        a.set_pending_neighbors(vec![b.neighbor_ref()]);
        for _ in 0..(FRAMES_PER_DAY * 10) {
            a.tick(&paused, &sinks).await;
        }
        assert_eq!(a.position(), start);
        assert_eq!(a.state(), DiseaseState::Infected);
        assert_eq!(a.day_counter(), 0);
        assert_eq!(a.committed_neighbor_ids(), [AgentId(1)]);
    }

    #[tokio::test]
    async fn neighbor_commit_lags_by_one_tick() {
        let sinks = Sinks::noop();
        let a = agent(0, false);
        let others: Vec<_> = (1..4).map(|i| agent(i, false)).collect();
        let params = still(DiseaseParams::default());

        a.set_pending_neighbors(others.iter().map(|o| o.neighbor_ref()).collect());
        assert!(a.committed_neighbor_ids().is_empty());
        a.tick(&params, &sinks).await;
        let expected: Vec<_> = others.iter().map(|o| o.id()).collect();
        assert_eq!(a.committed_neighbor_ids(), expected);

        for _ in 0..7 {
            a.tick(&params, &sinks).await;
            assert_eq!(a.committed_neighbor_ids(), expected);
        }
    }

    #[tokio::test]
    async fn movement_flag_controls_walking() {
        let sinks = Sinks::noop();
        let a = agent(0, false);
        let start = a.position();
        a.tick(&still(DiseaseParams::default()), &sinks).await;
        assert_eq!(a.position(), start);

        a.tick(&SimParams::default(), &sinks).await;
        assert_ne!(a.position(), start);
    }

    #[tokio::test]
    async fn reset_clears_mailbox_and_counters() {
        let sinks = Sinks::noop();
        let a = agent(0, true);
        let params = still(disease(0.0, 1.0, 0.0, 10.0, 10.0));
        run_day(&[a.clone()], &params, &sinks).await;
        a.tick(&params, &sinks).await;
        a.tick(&params, &sinks).await;
        assert_eq!(a.day_counter(), 1);
        for _ in 0..5 {
            a.mailbox().try_send(Message::HaveGerms).unwrap();
        }

        a.reset(false);
        assert_eq!(a.state(), DiseaseState::Vulnerable);
        assert_eq!(a.mailbox_len(), 0);
        assert_eq!(a.day_counter(), 0);

        // Frame counter rewound: the next boundary is a full day away.
        a.mailbox().try_send(Message::HaveGerms).unwrap();
        for _ in 0..FRAMES_PER_DAY - 1 {
            a.tick(&params, &sinks).await;
        }
        assert_eq!(a.state(), DiseaseState::Vulnerable);
        a.tick(&params, &sinks).await;
        assert_eq!(a.state(), DiseaseState::Infected);
    }

    #[tokio::test]
    async fn self_post_into_saturated_mailbox_drains_first() {
        let rec = Arc::new(Recorder::default());
        let sinks = rec.sinks();
        let a = Arc::new(Agent::with_mailbox(AgentId(0), Point::default(), true, 1, Mailbox::with_capacity(2)));
        a.mailbox().try_send(Message::HaveGerms).unwrap();
        a.mailbox().try_send(Message::HaveGerms).unwrap();

        run_day(&[a.clone()], &still(disease(0.0, 1.0, 0.0, 1.0, 5.0)), &sinks).await;
        assert_eq!(a.state(), DiseaseState::Sick);
        assert_eq!(a.mailbox_len(), 0);
        assert_eq!(rec.transitions.lock().len(), 1);
    }

    #[tokio::test]
    async fn spreading_waits_for_saturated_neighbor() {
        let sinks = Sinks::noop();
        let spreader = agent(0, true);
        let victim = Arc::new(Agent::with_mailbox(AgentId(1), Point::default(), false, 1, Mailbox::with_capacity(1)));
        link_all(&[spreader.clone(), victim.clone()], &sinks).await;
        victim.mailbox().try_send(Message::BecomeImmune).unwrap();

        let params = still(disease(1.0, 1.0, 0.0, 1.0, 5.0));
        for _ in 0..FRAMES_PER_DAY - 1 {
            spreader.tick(&params, &sinks).await;
        }
        let blocked = {
            let spreader = spreader.clone();
            tokio::spawn(async move { spreader.tick(&params, &Sinks::noop()).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!blocked.is_finished());

        assert_eq!(victim.mailbox().drain(), [Message::BecomeImmune]);
        blocked.await.unwrap();
        assert_eq!(victim.mailbox().drain(), [Message::HaveGerms]);
        assert_eq!(spreader.state(), DiseaseState::Sick);
    }

    #[tokio::test]
    async fn reset_during_spread_skips_the_pending_drain() {
        let sinks = Sinks::noop();
        let spreader = agent(0, true);
        let victim = Arc::new(Agent::with_mailbox(AgentId(1), Point::default(), false, 1, Mailbox::with_capacity(1)));
        link_all(&[spreader.clone(), victim.clone()], &sinks).await;
        victim.mailbox().try_send(Message::BecomeImmune).unwrap();

        let params = still(disease(1.0, 1.0, 0.0, 1.0, 5.0));
        for _ in 0..FRAMES_PER_DAY - 1 {
            spreader.tick(&params, &sinks).await;
        }
        let blocked = {
            let spreader = spreader.clone();
            tokio::spawn(async move { spreader.tick(&params, &Sinks::noop()).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!blocked.is_finished());
        assert_eq!(spreader.mailbox_len(), 1, "BecomeSick is queued behind the spread");

        spreader.reset(false);
        assert_eq!(victim.mailbox().drain(), [Message::BecomeImmune]);
        blocked.await.unwrap();

        assert_eq!(spreader.state(), DiseaseState::Vulnerable);
        assert_eq!(spreader.mailbox_len(), 0);
        assert_eq!(spreader.day_counter(), 0);
        assert_eq!(victim.mailbox().drain(), [Message::HaveGerms]);
    }

    #[tokio::test]
    async fn waiting_spreader_applies_its_own_full_mailbox() {
        let rec = Arc::new(Recorder::default());
        let sinks = rec.sinks();
        let spreader = Arc::new(Agent::with_mailbox(AgentId(0), Point::default(), true, 1, Mailbox::with_capacity(2)));
        let victim = Arc::new(Agent::with_mailbox(AgentId(1), Point::default(), false, 1, Mailbox::with_capacity(1)));
        link_all(&[spreader.clone(), victim.clone()], &sinks).await;
        victim.mailbox().try_send(Message::BecomeImmune).unwrap();

        let params = still(disease(1.0, 1.0, 0.0, 1.0, 5.0));
        for _ in 0..FRAMES_PER_DAY - 1 {
            spreader.tick(&params, &sinks).await;
        }
        let blocked = {
            let spreader = spreader.clone();
            let sinks = sinks.clone();
            tokio::spawn(async move { spreader.tick(&params, &sinks).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(spreader.state(), DiseaseState::Infected);

        // Fill the spreader's mailbox while it waits on the victim.
        spreader.mailbox().try_send(Message::HaveGerms).unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!blocked.is_finished());
        assert_eq!(spreader.state(), DiseaseState::Sick);
        assert_eq!(spreader.mailbox_len(), 0);
        assert_eq!(rec.net(Bucket::Sick), 1);

        victim.mailbox().drain();
        blocked.await.unwrap();
        assert_eq!(victim.mailbox().drain(), [Message::HaveGerms]);
        assert_eq!(rec.transitions.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_spread_applies_the_posted_outcome() {
        let rec = Arc::new(Recorder::default());
        let sinks = rec.sinks();
        let params = still(disease(1.0, 1.0, 0.0, 1.0, 1.0));
        let a = agent(0, true);
        run_day(&[a.clone()], &params, &sinks).await;
        assert_eq!(a.state(), DiseaseState::Sick);

        let victim = Arc::new(Agent::with_mailbox(AgentId(1), Point::default(), false, 1, Mailbox::with_capacity(1)));
        victim.mailbox().try_send(Message::BecomeImmune).unwrap();
        a.set_pending_neighbors(vec![victim.neighbor_ref()]);
        a.tick(&SimParams { paused: true, ..params }, &sinks).await;

        let (stop, shutdown) = watch::channel(false);
        let ctx = TaskContext {
            params:   Arc::new(SharedParams::new(params).unwrap()),
            sinks:    sinks.clone(),
            gate:     Arc::new(RwLock::new(())),
            shutdown,
        };
        let task = tokio::spawn(a.clone().run(ctx));
        tokio::time::sleep(params.day_length() * 2).await;

        // Illness is over: leaving Sick is reported, BecomeImmune waits
        // behind germs stuck on the victim.
        assert!(!task.is_finished());
        assert_eq!(rec.net(Bucket::Sick), 0);
        assert_eq!(a.mailbox_len(), 1);

        stop.send_replace(true);
        task.await.unwrap();
        assert_eq!(a.state(), DiseaseState::Immune);
        assert_eq!(a.mailbox_len(), 0);
        assert_eq!(rec.net(Bucket::Sick), 0);
        assert_eq!(rec.net(Bucket::Immune), 1);
        assert_eq!(victim.mailbox().drain(), [Message::BecomeImmune]);
    }

    /// Sink that reads its agent's state from inside every call.
    #[derive(Default)]
    struct Inspecting {
        agent: std::sync::OnceLock<Arc<Agent>>,
        seen:  Mutex<Vec<DiseaseState>>,
    }

    impl Inspecting {
        fn look(&self) {
            if let Some(agent) = self.agent.get() {
                self.seen.lock().push(agent.state());
            }
        }
    }

    impl MetricsSink for Inspecting {
        fn adjust(&self, _bucket: Bucket, _delta: i64) {
            self.look();
        }
    }

    impl HistorySink for Inspecting {
        fn record(&self, _record: TransitionRecord) {
            self.look();
        }

        fn current_day(&self) -> SimDay {
            SimDay::ZERO
        }
    }

    #[tokio::test]
    async fn sinks_are_called_with_the_agent_unlocked() {
        let inspecting = Arc::new(Inspecting::default());
        let sinks = Sinks::new(inspecting.clone(), inspecting.clone());
        let a = agent(0, true);
        assert!(inspecting.agent.set(a.clone()).is_ok());

        let params = still(disease(0.0, 1.0, 0.0, 1.0, 1.0));
        run_day(&[a.clone()], &params, &sinks).await;
        run_day(&[a.clone()], &params, &sinks).await;

        use DiseaseState::{Immune, Sick};
        assert_eq!(*inspecting.seen.lock(), [Sick, Sick, Sick, Sick, Immune, Immune]);
    }

    #[test]
    fn relieve_applies_queue_outside_a_tick() {
        let rec = Arc::new(Recorder::default());
        let sinks = rec.sinks();
        let a = agent(0, false);
        a.mailbox().try_send(Message::HaveGerms).unwrap();
        a.mailbox().try_send(Message::HaveGerms).unwrap();

        assert_eq!(a.relieve(&sinks), 2);
        assert_eq!(a.state(), DiseaseState::Infected);
        assert_eq!(a.mailbox_len(), 0);
        assert_eq!(rec.transitions.lock().len(), 1);
        assert_eq!(a.relieve(&sinks), 0);
    }

    #[tokio::test]
    async fn self_in_neighbor_list_is_skipped() {
        let sinks = Sinks::noop();
        let a = agent(0, true);
        a.set_pending_neighbors(vec![a.neighbor_ref()]);
        let params = still(disease(1.0, 1.0, 0.0, 1.0, 5.0));
        run_day(&[a.clone()], &params, &sinks).await;
        run_day(&[a.clone()], &params, &sinks).await;
        assert_eq!(a.state(), DiseaseState::Sick);
        assert_eq!(a.mailbox_len(), 0);
    }
}
