//! Double-buffered neighbor lists.
//!
//! The controller recomputes adjacency on its own schedule and writes the
//! result into an agent's [`PendingNeighbors`].  The agent copies pending
//! into its [`CommittedNeighbors`] once per tick, after all of that tick's
//! logic has run.  Spreading only ever iterates the committed list, so it
//! never observes a half-written assignment, and visibility lags the
//! controller by at most one tick.

use std::sync::Arc;

use parking_lot::Mutex;

use ct_core::AgentId;

use crate::Mailbox;

/// A handle to a peer: its ID plus its mailbox.
///
/// Holding a `NeighborRef` keeps only the peer's mailbox alive, so neighbor
/// lists never form reference cycles between agents.
#[derive(Clone, Debug)]
pub struct NeighborRef {
    pub id:      AgentId,
    pub mailbox: Arc<Mailbox>,
}

/// Controller-written buffer.
#[derive(Debug, Default)]
pub struct PendingNeighbors(Mutex<Vec<NeighborRef>>);

impl PendingNeighbors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole buffer.
    pub fn set(&self, neighbors: Vec<NeighborRef>) {
        *self.0.lock() = neighbors;
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.0.lock().iter().map(|n| n.id).collect()
    }
}

/// Agent-owned list read while spreading.
#[derive(Debug, Default)]
pub struct CommittedNeighbors(Vec<NeighborRef>);

impl CommittedNeighbors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the committed list with the current pending contents.
    pub fn commit_from(&mut self, pending: &PendingNeighbors) {
        self.0.clone_from(&pending.0.lock());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NeighborRef> {
        self.0.iter()
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.0.iter().map(|n| n.id).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
