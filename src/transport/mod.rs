//! Transport layer abstraction.
//!
//! The engine needs exactly two things from a socket: send a datagram to an
//! address, and receive the next datagram with its source. [`UdpTransport`]
//! is the production implementation.

mod udp;

#[cfg(test)]
mod mock;

pub use udp::*;

#[cfg(test)]
pub(crate) use mock::*;

use std::future::Future;
use std::io;
use std::net::SocketAddr;

/// Datagram transport consumed by the engine.
///
/// One transport serves one socket role. The engine drives `recv_from` from a
/// dedicated reader task while its event loop calls `send_to`, so both must
/// be usable concurrently through `&self`.
pub trait Transport: Send + Sync + 'static {
    /// Send one datagram.
    fn send_to(&self, data: &[u8], target: SocketAddr)
    -> impl Future<Output = io::Result<()>> + Send;

    /// Receive one datagram into `buf`, returning its length and source.
    fn recv_from(&self, buf: &mut [u8])
    -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// Local bind address.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}
