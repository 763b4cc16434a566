//! Handlers for unsolicited inbound messages.
//!
//! Anything that is not a Response to one of the engine's own requests
//! (traps, informs, requests arriving at the agent port) is delivered to the
//! [`MessageHandler`] registered for the socket [`Role`] that received it.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::message::CommunityMessage;

/// The socket an inbound datagram arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The main request socket (default port 161).
    Agent,
    /// The trap listener (default port 162).
    Trap,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Agent => f.write_str("agent"),
            Role::Trap => f.write_str("trap"),
        }
    }
}

/// Receiver for decoded unsolicited messages.
///
/// Handlers run on the engine's event loop. They must return quickly and
/// never block; hand heavy work to a channel or a spawned task.
///
/// Closures implement this trait directly:
///
/// ```
/// use snmp_engine::handler::MessageHandler;
/// use snmp_engine::message::CommunityMessage;
/// use std::net::SocketAddr;
///
/// fn assert_handler(_: impl MessageHandler) {}
/// assert_handler(|msg: CommunityMessage, from: SocketAddr| {
///     println!("{} from {}", msg.pdu.pdu_type(), from);
/// });
/// ```
pub trait MessageHandler: Send + Sync + 'static {
    fn handle(&self, message: CommunityMessage, source: SocketAddr);
}

impl<F> MessageHandler for F
where
    F: Fn(CommunityMessage, SocketAddr) + Send + Sync + 'static,
{
    fn handle(&self, message: CommunityMessage, source: SocketAddr) {
        self(message, source)
    }
}

pub(crate) type SharedHandler = Arc<dyn MessageHandler>;

/// Handler table indexed by [`Role`].
#[derive(Clone, Default)]
pub(crate) struct Handlers {
    agent: Option<SharedHandler>,
    trap: Option<SharedHandler>,
}

impl Handlers {
    pub(crate) fn set(&mut self, role: Role, handler: SharedHandler) {
        match role {
            Role::Agent => self.agent = Some(handler),
            Role::Trap => self.trap = Some(handler),
        }
    }

    pub(crate) fn get(&self, role: Role) -> Option<&SharedHandler> {
        match role {
            Role::Agent => self.agent.as_ref(),
            Role::Trap => self.trap.as_ref(),
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("agent", &self.agent.is_some())
            .field("trap", &self.trap.is_some())
            .finish()
    }
}
