//! Internal utilities.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::Instant;

/// Create and bind a non-blocking UDP socket.
///
/// IPv6 addresses are bound dual-stack (`IPV6_V6ONLY = false`).
/// `recv_buffer_size` is a hint; the kernel caps it at `net.core.rmem_max`
/// and a refusal is ignored.
///
/// Must be called from within a tokio runtime.
pub(crate) fn bind_udp_socket(
    addr: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    if let Some(size) = recv_buffer_size
        && let Err(err) = socket.set_recv_buffer_size(size)
    {
        tracing::debug!(target: "snmp_engine::transport", { size, %err }, "receive buffer size not applied");
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into())
}

/// Hundredths of a second since `start`, wrapping like sysUpTime.
pub(crate) fn timeticks_since(start: Instant) -> u32 {
    (start.elapsed().as_millis() / 10) as u32
}
