//! The request engine.
//!
//! An [`Engine`] owns one main socket (and optionally a trap socket) and a
//! single event loop task that serializes every ledger mutation. Handles are
//! cheap to clone and may be used from any task; each operation is submitted
//! to the loop and resolves exactly once.
//!
//! ```rust,no_run
//! use snmp_engine::{ClientOptions, Engine, oid};
//! # async fn example() -> snmp_engine::Result<()> {
//! let engine = Engine::builder().port(0).retries(1).bind().await?;
//! let client = engine.client("192.0.2.1:161".parse().unwrap(), ClientOptions::default());
//! for vb in client.get(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]).await? {
//!     println!("{vb}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod driver;
mod stats;

pub use config::*;
pub use driver::RequestState;
pub use stats::{EngineStats, StatsSnapshot};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::handler::{Handlers, Role};
use crate::ledger::RequestLedger;
use crate::message::{ClientOptions, CommunityMessage};
use crate::pdu::Pdu;
use crate::transport::{Transport, UdpTransport};
use crate::util::timeticks_since;

use driver::{Command, Driver, Pending, spawn_reader};

const INBOUND_QUEUE: usize = 1024;

struct EngineInner<T> {
    commands: mpsc::UnboundedSender<Command>,
    transport: Arc<T>,
    trap_transport: Option<Arc<T>>,
    stats: Arc<EngineStats>,
    config: EngineConfig,
    started: Instant,
}

/// Handle to a running engine.
pub struct Engine<T: Transport = UdpTransport> {
    inner: Arc<EngineInner<T>>,
}

impl<T: Transport> Clone for Engine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Engine<UdpTransport> {
    /// Start configuring an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }
}

impl<T: Transport> Engine<T> {
    fn start(
        config: EngineConfig,
        handlers: Handlers,
        ledger: RequestLedger<Pending>,
        transport: T,
        trap_transport: Option<T>,
    ) -> Self {
        let transport = Arc::new(transport);
        let trap_transport = trap_transport.map(Arc::new);
        let stats = Arc::new(EngineStats::default());

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE);

        let mut readers = vec![spawn_reader(
            Role::Agent,
            Arc::clone(&transport),
            inbound_tx.clone(),
            config.max_datagram,
        )];
        if let Some(trap) = &trap_transport {
            readers.push(spawn_reader(
                Role::Trap,
                Arc::clone(trap),
                inbound_tx.clone(),
                config.max_datagram,
            ));
        }

        let driver = Driver {
            ledger,
            transport: Arc::clone(&transport),
            handlers,
            stats: Arc::clone(&stats),
            config,
            commands: command_rx,
            inbound: inbound_rx,
            _inbound_tx: inbound_tx,
            readers,
        };
        tokio::spawn(driver.run());

        Self {
            inner: Arc::new(EngineInner {
                commands: command_tx,
                transport,
                trap_transport,
                stats,
                config,
                started: Instant::now(),
            }),
        }
    }

    /// Send a request-class PDU and wait for the matching Response.
    ///
    /// The engine assigns a fresh request ID; whatever ID `pdu` carries is
    /// replaced. Error statuses in the Response are returned as-is.
    pub async fn request(
        &self,
        target: SocketAddr,
        options: &ClientOptions,
        pdu: Pdu,
    ) -> Result<Pdu> {
        let pdu_type = pdu.pdu_type();
        if !pdu_type.is_request_class() {
            return Err(Error::NotConfirmed { pdu_type });
        }
        let (reply, response) = oneshot::channel();
        self.submit(Command::Request {
            target,
            message: CommunityMessage::with_options(options, pdu),
            reply,
        })?;
        response.await.map_err(|_| Error::Closed)?
    }

    /// Send a message once without tracking it.
    ///
    /// Common-field PDUs get a fresh request ID.
    pub async fn notify(&self, target: SocketAddr, message: CommunityMessage) -> Result<()> {
        let (reply, sent) = oneshot::channel();
        self.submit(Command::Notify {
            target,
            message,
            reply,
        })?;
        sent.await.map_err(|_| Error::Closed)?
    }

    fn submit(&self, command: Command) -> Result<()> {
        self.inner.commands.send(command).map_err(|_| Error::Closed)
    }

    /// Create a client bound to `target`.
    pub fn client(&self, target: SocketAddr, options: ClientOptions) -> Client<T> {
        Client::new(self.clone(), target, options)
    }

    /// Hundredths of a second since the engine started.
    pub fn uptime(&self) -> u32 {
        timeticks_since(self.inner.started)
    }

    /// Address of the main socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner
            .transport
            .local_addr()
            .map_err(|source| Error::Io {
                target: None,
                source,
            })
    }

    /// Address of the trap socket, if one is listening.
    pub fn trap_addr(&self) -> Option<SocketAddr> {
        self.inner
            .trap_transport
            .as_ref()
            .and_then(|t| t.local_addr().ok())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Stop the event loop. Pending requests fail with [`Error::Closed`].
    pub async fn close(&self) {
        let (ack, done) = oneshot::channel();
        if self.submit(Command::Close { ack }).is_ok() {
            let _ = done.await;
        }
    }
}

#[cfg(test)]
mod tests;
