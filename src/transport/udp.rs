//! UDP transport implementation.

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use super::Transport;
use crate::error::{Error, Result};
use crate::util::bind_udp_socket;

/// Unconnected UDP socket shared by every target of one engine.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind to `addr`, optionally requesting a receive buffer size.
    pub fn bind(addr: SocketAddr, recv_buffer_size: Option<usize>) -> Result<Self> {
        let socket = bind_udp_socket(addr, recv_buffer_size).map_err(|source| Error::Io {
            target: Some(addr),
            source,
        })?;
        tracing::debug!(target: "snmp_engine::transport", { snmp.local_addr = ?socket.local_addr().ok() }, "UDP transport bound");
        Ok(Self { socket })
    }
}

impl Transport for UdpTransport {
    async fn send_to(&self, data: &[u8], target: SocketAddr) -> io::Result<()> {
        tracing::trace!(target: "snmp_engine::transport", { snmp.target = %target, snmp.bytes = data.len() }, "UDP send");
        let sent = self.socket.send_to(data, target).await?;
        if sent != data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short UDP send: {} of {} bytes", sent, data.len()),
            ));
        }
        Ok(())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let (len, source) = self.socket.recv_from(buf).await?;
        tracing::trace!(target: "snmp_engine::transport", { snmp.source = %source, snmp.bytes = len }, "UDP recv");
        Ok((len, source))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
