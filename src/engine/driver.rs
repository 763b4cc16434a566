//! The engine event loop.
//!
//! One task owns the [`RequestLedger`] and processes, strictly one at a time,
//! caller commands, inbound datagrams from the reader tasks, and retry timer
//! expirations. Nothing else touches the ledger.

use std::future::poll_fn;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::handler::{Handlers, Role};
use crate::ledger::RequestLedger;
use crate::message::CommunityMessage;
use crate::pdu::{Pdu, PduType};
use crate::transport::Transport;

use super::config::EngineConfig;
use super::stats::EngineStats;

/// Lifecycle of one request-class PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Created,
    Sent,
    Retrying,
    Completed,
    TimedOut,
}

pub(super) enum Command {
    Request {
        target: SocketAddr,
        message: CommunityMessage,
        reply: oneshot::Sender<Result<Pdu>>,
    },
    Notify {
        target: SocketAddr,
        message: CommunityMessage,
        reply: oneshot::Sender<Result<()>>,
    },
    Close {
        ack: oneshot::Sender<()>,
    },
}

pub(super) struct Inbound {
    pub role: Role,
    pub data: Bytes,
    pub source: SocketAddr,
}

pub(super) struct Pending {
    target: SocketAddr,
    data: Bytes,
    retries_remaining: i64,
    state: RequestState,
    started: Instant,
    reply: oneshot::Sender<Result<Pdu>>,
}

pub(super) struct Driver<T> {
    pub ledger: RequestLedger<Pending>,
    pub transport: Arc<T>,
    pub handlers: Handlers,
    pub stats: Arc<EngineStats>,
    pub config: EngineConfig,
    pub commands: mpsc::UnboundedReceiver<Command>,
    pub inbound: mpsc::Receiver<Inbound>,
    // held so `inbound` never reports closed while readers restart or exit
    pub _inbound_tx: mpsc::Sender<Inbound>,
    pub readers: Vec<JoinHandle<()>>,
}

impl<T: Transport> Driver<T> {
    pub async fn run(mut self) {
        tracing::debug!(target: "snmp_engine::engine", "event loop started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Request { target, message, reply }) => {
                        self.start_request(target, message, reply).await;
                    }
                    Some(Command::Notify { target, message, reply }) => {
                        let _ = reply.send(self.notify(target, message).await);
                    }
                    Some(Command::Close { ack }) => {
                        self.shutdown();
                        let _ = ack.send(());
                        return;
                    }
                    None => {
                        self.shutdown();
                        return;
                    }
                },
                Some(inbound) = self.inbound.recv() => self.receive(inbound),
                Some(request_id) = poll_fn(|cx| self.ledger.poll_expired(cx)), if self.ledger.has_timers() => {
                    self.transmit(request_id).await;
                }
            }
        }
    }

    async fn start_request(
        &mut self,
        target: SocketAddr,
        mut message: CommunityMessage,
        reply: oneshot::Sender<Result<Pdu>>,
    ) {
        let request_id = self.ledger.alloc_request_id();
        message.pdu.set_request_id(request_id);

        let data = match message.encode() {
            Ok(data) => data,
            Err(err) => {
                let _ = reply.send(Err(err));
                return;
            }
        };

        let pending = Pending {
            target,
            data,
            retries_remaining: i64::from(self.config.retries),
            state: RequestState::Created,
            started: Instant::now(),
            reply,
        };
        if let Err(err) = self.ledger.register(request_id, pending) {
            tracing::error!(target: "snmp_engine::engine", { snmp.request_id = request_id, %err }, "ledger rejected fresh request ID");
            return;
        }
        tracing::debug!(target: "snmp_engine::engine", { snmp.request_id = request_id, snmp.target = %target, snmp.pdu_type = %message.pdu.pdu_type(), state = ?RequestState::Created }, "request created");

        self.transmit(request_id).await;
    }

    /// Send (or resend) a live request, or end it once retries run out.
    async fn transmit(&mut self, request_id: i32) {
        let Some(pending) = self.ledger.get_mut(request_id) else {
            return;
        };

        if pending.reply.is_closed() {
            tracing::debug!(target: "snmp_engine::engine", { snmp.request_id = request_id }, "caller gone, dropping request");
            let _ = self.ledger.unregister(request_id);
            return;
        }

        if pending.retries_remaining < 0 {
            let Ok(mut pending) = self.ledger.unregister(request_id) else {
                return;
            };
            pending.state = RequestState::TimedOut;
            self.stats.record_timeout();
            let elapsed = pending.started.elapsed();
            tracing::debug!(target: "snmp_engine::engine", { snmp.request_id = request_id, snmp.target = %pending.target, ?elapsed, state = ?pending.state }, "request timed out");
            let _ = pending.reply.send(Err(Error::Timeout {
                target: pending.target,
                elapsed,
                request_id,
                retries: self.config.retries,
            }));
            return;
        }

        pending.retries_remaining -= 1;
        if pending.state == RequestState::Sent {
            pending.state = RequestState::Retrying;
            tracing::debug!(target: "snmp_engine::engine", { snmp.request_id = request_id, retries_remaining = pending.retries_remaining + 1, state = ?pending.state }, "retrying request");
        }
        let target = pending.target;
        let data = pending.data.clone();

        match self.transport.send_to(&data, target).await {
            Ok(()) => {
                self.stats.record_sent();
                if let Some(pending) = self.ledger.get_mut(request_id) {
                    pending.state = RequestState::Sent;
                }
                if let Err(err) = self.ledger.arm_timer(request_id, self.config.timeout) {
                    tracing::error!(target: "snmp_engine::engine", { snmp.request_id = request_id, %err }, "failed to arm retry timer");
                }
            }
            Err(source) => {
                self.stats.record_send_failure();
                tracing::debug!(target: "snmp_engine::engine", { snmp.request_id = request_id, snmp.target = %target, err = %source }, "send failed");
                if let Ok(pending) = self.ledger.unregister(request_id) {
                    let _ = pending.reply.send(Err(Error::SendFailure {
                        target,
                        request_id,
                        source,
                    }));
                }
            }
        }
    }

    async fn notify(&mut self, target: SocketAddr, mut message: CommunityMessage) -> Result<()> {
        let request_id = self.ledger.alloc_request_id();
        message.pdu.set_request_id(request_id);
        let data = message.encode()?;

        match self.transport.send_to(&data, target).await {
            Ok(()) => {
                self.stats.record_sent();
                tracing::debug!(target: "snmp_engine::engine", { snmp.target = %target, snmp.pdu_type = %message.pdu.pdu_type() }, "notification sent");
                Ok(())
            }
            Err(source) => {
                self.stats.record_send_failure();
                Err(Error::SendFailure {
                    target,
                    request_id: message.pdu.request_id().unwrap_or_default(),
                    source,
                })
            }
        }
    }

    fn receive(&mut self, inbound: Inbound) {
        let Inbound { role, data, source } = inbound;
        self.stats.record_received();

        let message = match CommunityMessage::from_bytes(data) {
            Ok(message) => message,
            Err(err) => {
                self.stats.record_malformed();
                tracing::debug!(target: "snmp_engine::engine", { snmp.source = %source, %role, %err }, "dropping undecodable datagram");
                return;
            }
        };

        if message.pdu.pdu_type() != PduType::Response {
            self.dispatch(role, message, source);
            return;
        }

        let Some(request_id) = message.pdu.request_id() else {
            return;
        };
        let Ok(mut pending) = self.ledger.unregister(request_id) else {
            self.stats.record_late_response();
            tracing::debug!(target: "snmp_engine::engine", { snmp.request_id = request_id, snmp.source = %source }, "response for unknown or expired request");
            return;
        };

        if pending.target != source {
            tracing::warn!(target: "snmp_engine::engine", { snmp.request_id = request_id, snmp.target = %pending.target, snmp.source = %source }, "response source differs from request target");
        }
        pending.state = RequestState::Completed;
        tracing::debug!(target: "snmp_engine::engine", { snmp.request_id = request_id, elapsed = ?pending.started.elapsed(), state = ?pending.state }, "request completed");
        let _ = pending.reply.send(Ok(message.pdu));
    }

    fn dispatch(&self, role: Role, message: CommunityMessage, source: SocketAddr) {
        match self.handlers.get(role) {
            Some(handler) => {
                tracing::trace!(target: "snmp_engine::engine", { snmp.source = %source, %role, snmp.pdu_type = %message.pdu.pdu_type() }, "dispatching to handler");
                handler.handle(message, source);
            }
            None => {
                self.stats.record_unhandled();
                tracing::debug!(target: "snmp_engine::engine", { snmp.source = %source, %role, snmp.pdu_type = %message.pdu.pdu_type() }, "no handler registered, dropping");
            }
        }
    }

    fn shutdown(&mut self) {
        for (request_id, pending) in self.ledger.drain() {
            tracing::debug!(target: "snmp_engine::engine", { snmp.request_id = request_id }, "closing pending request");
            let _ = pending.reply.send(Err(Error::Closed));
        }
        for reader in self.readers.drain(..) {
            reader.abort();
        }
        tracing::debug!(target: "snmp_engine::engine", "event loop stopped");
    }
}

/// First pause after a failed receive; doubles per consecutive failure.
const RECV_BACKOFF_MIN: Duration = Duration::from_millis(10);
const RECV_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Forward datagrams from one socket into the event loop.
pub(super) fn spawn_reader<T: Transport>(
    role: Role,
    transport: Arc<T>,
    tx: mpsc::Sender<Inbound>,
    max_datagram: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; max_datagram];
        let mut backoff = RECV_BACKOFF_MIN;
        loop {
            match transport.recv_from(&mut buf).await {
                Ok((len, source)) => {
                    backoff = RECV_BACKOFF_MIN;
                    let inbound = Inbound {
                        role,
                        data: Bytes::copy_from_slice(&buf[..len]),
                        source,
                    };
                    if tx.send(inbound).await.is_err() {
                        return;
                    }
                }
                Err(err) => {
                    tracing::error!(target: "snmp_engine::engine", { %role, %err, backoff = ?backoff }, "socket receive failed");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(RECV_BACKOFF_MAX);
                }
            }
        }
    })
}
