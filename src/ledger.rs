//! In-flight request tracking.
//!
//! [`RequestLedger`] is keyed storage for outstanding requests plus the
//! per-request retry timers. It belongs to exactly one engine event loop and
//! is never shared, so no locking is involved: registering, unregistering and
//! timer expiry are all plain `&mut self` calls on that one task.

use std::collections::HashMap;
use std::task::{Context, Poll};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::time::DelayQueue;
use tokio_util::time::delay_queue::Key;

use crate::error::{Error, Result};

struct Slot<E> {
    entry: E,
    timer: Option<Key>,
}

/// Request ledger owning entries of type `E`.
pub struct RequestLedger<E> {
    entries: HashMap<i32, Slot<E>>,
    timers: DelayQueue<i32>,
    rng: StdRng,
}

impl<E> RequestLedger<E> {
    /// Create a ledger with an entropy-seeded ID generator.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a ledger with a deterministic ID sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            entries: HashMap::new(),
            timers: DelayQueue::new(),
            rng,
        }
    }

    /// Draw a non-negative request ID that is not currently live.
    pub fn alloc_request_id(&mut self) -> i32 {
        loop {
            let id = self.rng.gen_range(0..=i32::MAX);
            if !self.entries.contains_key(&id) {
                return id;
            }
            tracing::trace!(target: "snmp_engine::ledger", { snmp.request_id = id }, "request ID collision, redrawing");
        }
    }

    /// Store `entry` under `request_id`.
    pub fn register(&mut self, request_id: i32, entry: E) -> Result<()> {
        if self.entries.contains_key(&request_id) {
            return Err(Error::DuplicateRequestId { request_id });
        }
        self.entries.insert(request_id, Slot { entry, timer: None });
        Ok(())
    }

    /// Remove and return the entry, cancelling its timer.
    pub fn unregister(&mut self, request_id: i32) -> Result<E> {
        let slot = self
            .entries
            .remove(&request_id)
            .ok_or(Error::UnknownRequestId { request_id })?;
        if let Some(key) = slot.timer {
            self.timers.try_remove(&key);
        }
        Ok(slot.entry)
    }

    /// (Re)arm the entry's timer to fire after `timeout`.
    pub fn arm_timer(&mut self, request_id: i32, timeout: Duration) -> Result<()> {
        let slot = self
            .entries
            .get_mut(&request_id)
            .ok_or(Error::UnknownRequestId { request_id })?;
        match &slot.timer {
            Some(key) => self.timers.reset(key, timeout),
            None => slot.timer = Some(self.timers.insert(request_id, timeout)),
        }
        Ok(())
    }

    /// Poll for the next entry whose timer fired.
    ///
    /// The entry stays registered; only its timer is consumed. Returns
    /// `Ready(None)` when no timers are armed.
    pub fn poll_expired(&mut self, cx: &mut Context<'_>) -> Poll<Option<i32>> {
        loop {
            let Some(expired) = std::task::ready!(self.timers.poll_expired(cx)) else {
                return Poll::Ready(None);
            };
            let key = expired.key();
            let request_id = expired.into_inner();
            if let Some(slot) = self.entries.get_mut(&request_id)
                && slot.timer == Some(key)
            {
                slot.timer = None;
                return Poll::Ready(Some(request_id));
            }
        }
    }

    /// Whether any timer is armed.
    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn contains(&self, request_id: i32) -> bool {
        self.entries.contains_key(&request_id)
    }

    pub fn get_mut(&mut self, request_id: i32) -> Option<&mut E> {
        self.entries.get_mut(&request_id).map(|slot| &mut slot.entry)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry and timer, yielding the entries.
    pub fn drain(&mut self) -> impl Iterator<Item = (i32, E)> + '_ {
        self.timers.clear();
        self.entries.drain().map(|(id, slot)| (id, slot.entry))
    }
}

impl<E> Default for RequestLedger<E> {
    fn default() -> Self {
        Self::new()
    }
}
