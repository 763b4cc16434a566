//! Subtree walk stream.

use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::transport::Transport;
use crate::varbind::VarBind;
use crate::version::Version;

use super::Client;

type Step = Pin<Box<dyn Future<Output = Result<Option<VarBind>>> + Send>>;

/// Async stream for walking an OID subtree using GETNEXT.
///
/// Each step waits for the previous reply, since the next request starts from
/// the OID it returned. The stream ends cleanly when a returned OID is no
/// longer a strict descendant of the root or carries an exception value.
///
/// Created by [`Client::walk()`].
pub struct Walk<T: Transport> {
    client: Client<T>,
    root: Oid,
    cursor: Oid,
    /// Last OID returned to the caller, for detecting agents that loop.
    last_returned: Option<Oid>,
    done: bool,
    pending: Option<Step>,
}

impl<T: Transport> Walk<T> {
    pub(crate) fn new(client: Client<T>, root: Oid) -> Self {
        Self {
            client,
            cursor: root.clone(),
            root,
            last_returned: None,
            done: false,
            pending: None,
        }
    }

    pub fn root(&self) -> &Oid {
        &self.root
    }

    /// Wait for the next binding.
    pub async fn next(&mut self) -> Option<Result<VarBind>> {
        poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Drain the walk, stopping at the first error.
    pub async fn collect(mut self) -> Result<Vec<VarBind>> {
        let mut varbinds = Vec::new();
        while let Some(vb) = self.next().await {
            varbinds.push(vb?);
        }
        Ok(varbinds)
    }

    fn finish(&mut self) -> Poll<Option<Result<VarBind>>> {
        tracing::debug!(target: "snmp_engine::client", { snmp.root = %self.root, snmp.cursor = %self.cursor }, "walk complete");
        self.done = true;
        Poll::Ready(None)
    }
}

impl<T: Transport> Stream for Walk<T> {
    type Item = Result<VarBind>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.done {
            return Poll::Ready(None);
        }

        if this.pending.is_none() {
            let client = this.client.clone();
            let oid = this.cursor.clone();
            this.pending = Some(Box::pin(async move {
                let varbinds = client.get_next(std::slice::from_ref(&oid)).await?;
                Ok(varbinds.into_iter().next())
            }));
        }
        let Some(pending) = this.pending.as_mut() else {
            return Poll::Ready(None);
        };

        let result = match pending.as_mut().poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(result) => result,
        };
        this.pending = None;

        let vb = match result {
            Ok(Some(vb)) => vb,
            Ok(None) => return this.finish(),
            // SNMPv1 agents report the end of the MIB as noSuchName
            Err(Error::Snmp {
                status: ErrorStatus::NoSuchName,
                ..
            }) if this.client.options().version == Version::V1 => return this.finish(),
            Err(e) => {
                this.done = true;
                return Poll::Ready(Some(Err(e)));
            }
        };

        if vb.value.is_exception() || !vb.oid.is_strict_descendant_of(&this.root) {
            return this.finish();
        }

        if let Some(previous) = this.last_returned.take()
            && vb.oid <= previous
        {
            this.done = true;
            return Poll::Ready(Some(Err(Error::NonIncreasingOid {
                previous,
                current: vb.oid,
            })));
        }

        this.cursor = vb.oid.clone();
        this.last_returned = Some(vb.oid.clone());
        Poll::Ready(Some(Ok(vb)))
    }
}
