//! `Mailbox` — the bounded queue through which every state change is requested.
//!
//! # Protocol
//!
//! - Producers are the owning agent and any neighbor that is spreading.
//! - The owner is the only consumer and drains inside its own tick.
//! - [`send`](Mailbox::send) never drops: when the queue is full it waits
//!   until the owner drains or the controller clears.
//! - [`drain`](Mailbox::drain) takes exactly what is queued at that instant.
//!   Messages that arrive afterwards stay queued for the next drain.
//!
//! The queue itself is a `VecDeque` behind a `parking_lot::Mutex`; critical
//! sections are a push or a swap, never an await.  Waiting producers park on
//! a `tokio::sync::Notify` that is signalled whenever space is freed; a
//! second one is signalled whenever a push fills the queue, for an owner
//! that must notice saturation while it is itself waiting to send.

use std::collections::VecDeque;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::warn;

use crate::Message;

/// Messages a mailbox holds before producers start waiting.
pub const MAILBOX_CAPACITY: usize = 50;

/// Returned by [`Mailbox::try_send`] when the queue is saturated.  Hands the
/// message back so the caller can retry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("mailbox full, {0:?} not enqueued")]
pub struct MailboxFull(pub Message);

#[derive(Debug)]
pub struct Mailbox {
    queue:    Mutex<VecDeque<Message>>,
    capacity: usize,
    space:    Notify,
    filled:   Notify,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::with_capacity(MAILBOX_CAPACITY)
    }

    /// A mailbox holding at most `capacity` messages (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            space:  Notify::new(),
            filled: Notify::new(),
        }
    }

    /// Enqueue without waiting.
    pub fn try_send(&self, message: Message) -> Result<(), MailboxFull> {
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            return Err(MailboxFull(message));
        }
        queue.push_back(message);
        if queue.len() >= self.capacity {
            self.filled.notify_waiters();
        }
        Ok(())
    }

    /// Enqueue, waiting for space if the mailbox is full.
    ///
    /// Completes without yielding when there is room.
    pub async fn send(&self, message: Message) {
        if self.try_send(message).is_ok() {
            return;
        }
        warn!(?message, capacity = self.capacity, "mailbox saturated, producer waiting");
        loop {
            let notified = self.space.notified();
            tokio::pin!(notified);
            // Register before re-checking so a drain between the check and
            // the await still wakes us.
            notified.as_mut().enable();
            if self.try_send(message).is_ok() {
                return;
            }
            notified.await;
        }
    }

    /// Resolves once the queue is at capacity, immediately if it already is.
    pub async fn full(&self) {
        loop {
            let notified = self.filled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_full() {
                return;
            }
            notified.await;
        }
    }

    /// Remove and return everything queued right now, oldest first.
    pub fn drain(&self) -> Vec<Message> {
        let drained: Vec<Message> = self.queue.lock().drain(..).collect();
        if !drained.is_empty() {
            self.space.notify_waiters();
        }
        drained
    }

    /// Discard everything queued.  Used by reset.
    pub fn clear(&self) {
        self.queue.lock().clear();
        self.space.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.lock().len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
