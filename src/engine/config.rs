//! Engine configuration and builder.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::handler::{Handlers, MessageHandler, Role};
use crate::ledger::RequestLedger;
use crate::transport::{Transport, UdpTransport};

use super::Engine;

/// Default agent (request) port.
pub const DEFAULT_PORT: u16 = 161;

/// Default trap listener port.
pub const DEFAULT_TRAP_PORT: u16 = 162;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest datagram the reader tasks accept.
pub const DEFAULT_MAX_DATAGRAM: usize = 65535;

/// Runtime retry and buffer settings of a running engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Wait per transmit attempt before retrying.
    pub timeout: Duration,
    /// Retransmissions after the first send. Zero means send once.
    pub retries: u32,
    /// Receive buffer size per datagram.
    pub max_datagram: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
            max_datagram: DEFAULT_MAX_DATAGRAM,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TrapListener {
    interface: Option<IpAddr>,
    port: u16,
}

/// Builder for [`Engine`].
///
/// | Setting | Default |
/// |---|---|
/// | interface | `0.0.0.0` |
/// | port | 161 |
/// | trap listener | off (port 162 once enabled) |
/// | retries | 0 |
/// | timeout | 5 s |
/// | max datagram | 65535 |
///
/// ```rust,no_run
/// # use snmp_engine::{Engine, Role};
/// # use std::time::Duration;
/// # async fn example() -> snmp_engine::Result<()> {
/// let engine = Engine::builder()
///     .port(0)
///     .trap_port(1162)
///     .retries(2)
///     .timeout(Duration::from_secs(1))
///     .handler(Role::Trap, |msg: snmp_engine::CommunityMessage, from| {
///         println!("trap from {from}: {:?}", msg.pdu.varbinds());
///     })
///     .bind()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct EngineBuilder {
    interface: IpAddr,
    port: u16,
    trap: Option<TrapListener>,
    recv_buffer_size: Option<usize>,
    config: EngineConfig,
    handlers: Handlers,
    seed: Option<u64>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            trap: None,
            recv_buffer_size: None,
            config: EngineConfig::default(),
            handlers: Handlers::default(),
            seed: None,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the main socket binds to.
    pub fn interface(mut self, interface: IpAddr) -> Self {
        self.interface = interface;
        self
    }

    /// Port of the main socket. Use 0 for an ephemeral port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable the trap listener on `port`.
    pub fn trap_port(mut self, port: u16) -> Self {
        self.trap
            .get_or_insert(TrapListener {
                interface: None,
                port,
            })
            .port = port;
        self
    }

    /// Enable the trap listener bound to `interface`.
    ///
    /// Without this the trap socket shares the main socket's interface.
    pub fn trap_interface(mut self, interface: IpAddr) -> Self {
        self.trap
            .get_or_insert(TrapListener {
                interface: None,
                port: DEFAULT_TRAP_PORT,
            })
            .interface = Some(interface);
        self
    }

    /// Retransmissions after the first send.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Wait per transmit attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Kernel receive buffer size hint for bound sockets.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = Some(size);
        self
    }

    /// Largest datagram accepted; longer ones are truncated by the socket.
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.config.max_datagram = size;
        self
    }

    /// Register the handler for unsolicited messages arriving on `role`.
    pub fn handler(mut self, role: Role, handler: impl MessageHandler) -> Self {
        self.handlers.set(role, Arc::new(handler));
        self
    }

    /// Seed the request ID generator for reproducible runs.
    pub fn request_id_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Bind UDP sockets and start the engine.
    pub async fn bind(self) -> Result<Engine<UdpTransport>> {
        let main_addr = SocketAddr::new(self.interface, self.port);
        let transport = UdpTransport::bind(main_addr, self.recv_buffer_size)?;

        let trap = match self.trap {
            Some(listener) => {
                let addr = SocketAddr::new(listener.interface.unwrap_or(self.interface), listener.port);
                Some(UdpTransport::bind(addr, self.recv_buffer_size)?)
            }
            None => None,
        };

        Ok(self.build(transport, trap))
    }

    /// Start the engine on caller-supplied transports.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build<T: Transport>(self, transport: T, trap: Option<T>) -> Engine<T> {
        let ledger = match self.seed {
            Some(seed) => RequestLedger::with_seed(seed),
            None => RequestLedger::new(),
        };
        Engine::start(self.config, self.handlers, ledger, transport, trap)
    }
}
