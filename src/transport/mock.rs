//! Mock transport for testing.
//!
//! Records every datagram the engine sends and lets tests inject inbound
//! datagrams, so engine behaviour can be driven under paused time without a
//! network.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use tokio::sync::{Mutex, mpsc};

use super::Transport;

/// A datagram sent through the mock transport.
#[derive(Clone, Debug)]
pub(crate) struct SentDatagram {
    pub data: Bytes,
    pub target: SocketAddr,
}

struct MockInner {
    local_addr: SocketAddr,
    inbound_tx: mpsc::UnboundedSender<(Bytes, SocketAddr)>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<(Bytes, SocketAddr)>>,
    sent_tx: mpsc::UnboundedSender<SentDatagram>,
    sent_rx: Mutex<mpsc::UnboundedReceiver<SentDatagram>>,
    fail_sends: AtomicBool,
    failing_recvs: AtomicUsize,
    recv_failures: AtomicUsize,
}

/// Cloneable mock; clones share state, so a test keeps one clone while the
/// engine owns another.
#[derive(Clone)]
pub(crate) struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    pub fn new(local_addr: SocketAddr) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(MockInner {
                local_addr,
                inbound_tx,
                inbound_rx: Mutex::new(inbound_rx),
                sent_tx,
                sent_rx: Mutex::new(sent_rx),
                fail_sends: AtomicBool::new(false),
                failing_recvs: AtomicUsize::new(0),
                recv_failures: AtomicUsize::new(0),
            }),
        }
    }

    /// Deliver a datagram as if it arrived from `source`.
    pub fn inject(&self, data: impl Into<Bytes>, source: SocketAddr) {
        let _ = self.inner.inbound_tx.send((data.into(), source));
    }

    /// Wait for the next datagram the engine sends.
    pub async fn next_sent(&self) -> SentDatagram {
        let mut rx = self.inner.sent_rx.lock().await;
        match rx.recv().await {
            Some(datagram) => datagram,
            None => std::future::pending().await,
        }
    }

    /// Take a sent datagram if one is already queued.
    pub fn try_next_sent(&self) -> Option<SentDatagram> {
        self.inner.sent_rx.try_lock().ok()?.try_recv().ok()
    }

    /// Make every following send fail with an I/O error.
    pub fn fail_sends(&self, fail: bool) {
        self.inner.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make the next `count` receives fail with an I/O error.
    pub fn fail_recvs(&self, count: usize) {
        self.inner.failing_recvs.store(count, Ordering::SeqCst);
    }

    /// Receives that have failed so far.
    pub fn recv_failures(&self) -> usize {
        self.inner.recv_failures.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    async fn send_to(&self, data: &[u8], target: SocketAddr) -> io::Result<()> {
        if self.inner.fail_sends.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NetworkUnreachable, "mock send failure"));
        }
        let _ = self.inner.sent_tx.send(SentDatagram {
            data: Bytes::copy_from_slice(data),
            target,
        });
        Ok(())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let failing = self
            .inner
            .failing_recvs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            self.inner.recv_failures.fetch_add(1, Ordering::SeqCst);
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "mock receive failure"));
        }
        let mut rx = self.inner.inbound_rx.lock().await;
        let Some((data, source)) = rx.recv().await else {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock closed"));
        };
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok((len, source))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.inner.local_addr)
    }
}
