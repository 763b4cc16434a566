//! Engine traffic counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated by the event loop and readable from any handle.
#[derive(Debug, Default)]
pub struct EngineStats {
    sent: AtomicU64,
    received: AtomicU64,
    timeouts: AtomicU64,
    send_failures: AtomicU64,
    late_responses: AtomicU64,
    malformed: AtomicU64,
    unhandled: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Datagrams transmitted, retransmissions included.
    pub sent: u64,
    /// Datagrams received on any socket.
    pub received: u64,
    /// Requests that exhausted their retries.
    pub timeouts: u64,
    pub send_failures: u64,
    /// Responses whose request ID was no longer live.
    pub late_responses: u64,
    /// Datagrams that did not decode as SNMP messages.
    pub malformed: u64,
    /// Unsolicited messages with no handler for their socket.
    pub unhandled: u64,
}

macro_rules! counter {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            pub(crate) fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl EngineStats {
    counter! {
        record_sent => sent,
        record_received => received,
        record_timeout => timeouts,
        record_send_failure => send_failures,
        record_late_response => late_responses,
        record_malformed => malformed,
        record_unhandled => unhandled,
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            late_responses: self.late_responses.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} sent, {} received, {} timed out, {} send failures, {} late replies",
            self.sent, self.received, self.timeouts, self.send_failures, self.late_responses
        )
    }
}
