//! `ct-agent` — one simulated individual and everything it owns.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`disease`]     | `DiseaseState`, `Message`, the pure transition table      |
//! | [`mailbox`]     | `Mailbox` — bounded, blocking-on-full message queue        |
//! | [`neighbors`]   | `NeighborRef`, pending/committed neighbor buffers         |
//! | [`sink`]        | `MetricsSink`, `HistorySink`, `Sinks` bundle              |
//! | [`agent`]       | `Agent` — the execution unit: `tick`, `run`, `reset`      |
//!
//! # Design notes
//!
//! All state mutation goes through the mailbox.  Neighbors post `HaveGerms`
//! into it while spreading; the agent posts its own `BecomeSick`,
//! `BecomeImmune`, … requests into it while progressing.  The agent is the
//! only consumer and drains the mailbox once per simulated day, inside its
//! own tick, so the state field is only ever written from one place.
//!
//! Neighbor lists are double-buffered: the controller overwrites the
//! *pending* buffer whenever it likes, and the agent copies pending into its
//! *committed* list at the end of every tick.  Spreading always reads a
//! fully formed committed list.

pub mod agent;
pub mod disease;
pub mod mailbox;
pub mod neighbors;
pub mod sink;

#[cfg(test)]
mod tests;

pub use agent::{Agent, TaskContext};
pub use disease::{Applied, DiseaseState, Message};
pub use mailbox::{MAILBOX_CAPACITY, Mailbox, MailboxFull};
pub use neighbors::{CommittedNeighbors, NeighborRef, PendingNeighbors};
pub use sink::{
    Bucket, HistorySink, MetricDelta, MetricsSink, NoopHistory, NoopMetrics, Sinks,
    TransitionRecord,
};
