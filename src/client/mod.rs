//! Caller-facing SNMP operations.
//!
//! A [`Client`] pairs an [`Engine`] handle with one target address and the
//! envelope options (version, community) used for every message it sends.
//! Clients are cheap to clone; all clones share the engine's sockets and
//! request ledger.

mod table;
mod walk;

#[cfg(test)]
mod testing;

pub use table::Table;
pub use walk::Walk;

use std::net::{Ipv4Addr, SocketAddr};

use crate::engine::Engine;
use crate::error::{Error, ErrorStatus, Result};
use crate::message::{ClientOptions, CommunityMessage};
use crate::oid::Oid;
use crate::pdu::{GenericTrap, Pdu, TrapV1Fields};
use crate::transport::{Transport, UdpTransport};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// `sysUpTime.0`
pub(crate) fn sys_uptime() -> Oid {
    crate::oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}

/// `snmpTrapOID.0`
pub(crate) fn snmp_trap_oid() -> Oid {
    crate::oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0)
}

/// `snmpTrapEnterprise.0`
pub(crate) fn snmp_trap_enterprise() -> Oid {
    crate::oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 3, 0)
}

/// SNMP client bound to one target.
///
/// Created by [`Engine::client()`].
///
/// ```rust,no_run
/// use snmp_engine::{ClientOptions, Engine, Version, oid};
/// # async fn example() -> snmp_engine::Result<()> {
/// let engine = Engine::builder().port(0).bind().await?;
/// let client = engine.client(
///     "192.0.2.1:161".parse().unwrap(),
///     ClientOptions::new(Version::V1, "private"),
/// );
/// let uptime = client.get(&[oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)]).await?;
/// # Ok(())
/// # }
/// ```
pub struct Client<T: Transport = UdpTransport> {
    engine: Engine<T>,
    target: SocketAddr,
    options: ClientOptions,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            target: self.target,
            options: self.options.clone(),
        }
    }
}

impl<T: Transport> Client<T> {
    pub(crate) fn new(engine: Engine<T>, target: SocketAddr, options: ClientOptions) -> Self {
        Self {
            engine,
            target,
            options,
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn engine(&self) -> &Engine<T> {
        &self.engine
    }

    /// Send any request-class PDU and return the raw Response.
    ///
    /// Unlike the typed operations, a non-zero error status is not turned
    /// into an error.
    pub async fn request(&self, pdu: Pdu) -> Result<Pdu> {
        self.engine.request(self.target, &self.options, pdu).await
    }

    /// GET the given OIDs.
    pub async fn get(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let response = self.request(Pdu::get_request(0, oids)).await?;
        self.check(response, oids)
    }

    /// GETNEXT from each of the given OIDs.
    pub async fn get_next(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let response = self.request(Pdu::get_next_request(0, oids)).await?;
        self.check(response, oids)
    }

    /// SET the given bindings.
    pub async fn set(&self, varbinds: &[VarBind]) -> Result<Vec<VarBind>> {
        let oids: Vec<Oid> = varbinds.iter().map(|vb| vb.oid.clone()).collect();
        let response = self
            .request(Pdu::set_request(0, varbinds.to_vec()))
            .await?;
        self.check(response, &oids)
    }

    /// GETBULK (SNMPv2c only).
    ///
    /// The first `non_repeaters` OIDs get one successor each; the rest get up
    /// to `max_repetitions` successors.
    pub async fn get_bulk(
        &self,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Result<Vec<VarBind>> {
        self.require_v2c()?;
        let response = self
            .request(Pdu::get_bulk(0, non_repeaters, max_repetitions, oids))
            .await?;
        self.check(response, oids)
    }

    /// Walk the subtree under `root` with sequential GETNEXT requests.
    pub fn walk(&self, root: Oid) -> Walk<T> {
        Walk::new(self.clone(), root)
    }

    /// Walk a conceptual table and arrange the cells by row index.
    ///
    /// `table_oid` is the table object itself (e.g. `ifTable`), not its entry.
    pub async fn table(&self, table_oid: &Oid) -> Result<Table> {
        let varbinds = self.walk(table_oid.clone()).collect().await?;
        Ok(Table::from_varbinds(table_oid, &varbinds))
    }

    /// Send an unconfirmed trap.
    ///
    /// Under SNMPv1 this is a Trap-PDU stamped with the engine uptime. Under
    /// SNMPv2c it is an SNMPv2-Trap-PDU whose `snmpTrapOID.0` is derived from
    /// `generic` and `specific` (RFC 3584 Section 3.1) and whose last varbind
    /// is `snmpTrapEnterprise.0`.
    pub async fn trap(
        &self,
        enterprise: &Oid,
        agent_addr: Ipv4Addr,
        generic: GenericTrap,
        specific: i32,
        varbinds: Vec<VarBind>,
    ) -> Result<()> {
        let fields = TrapV1Fields {
            enterprise: enterprise.clone(),
            agent_addr: agent_addr.octets(),
            generic_trap: generic.as_i32(),
            specific_trap: specific,
            time_stamp: self.engine.uptime(),
        };

        let pdu = match self.options.version {
            Version::V1 => Pdu::trap_v1(fields, varbinds),
            Version::V2c => {
                let trap_oid = fields.v2_trap_oid();
                let mut body = self.notification_header(trap_oid, varbinds);
                body.push(VarBind::new(
                    snmp_trap_enterprise(),
                    Value::ObjectIdentifier(fields.enterprise),
                ));
                Pdu::trap_v2(0, body)
            }
        };

        let message = CommunityMessage::with_options(&self.options, pdu);
        self.engine.notify(self.target, message).await
    }

    /// Send a confirmed notification (SNMPv2c only) and wait for the ack.
    pub async fn inform(&self, trap_oid: Oid, varbinds: Vec<VarBind>) -> Result<Vec<VarBind>> {
        self.require_v2c()?;
        let body = self.notification_header(trap_oid, varbinds);
        let oids: Vec<Oid> = body.iter().map(|vb| vb.oid.clone()).collect();
        let response = self.request(Pdu::inform_request(0, body)).await?;
        self.check(response, &oids)
    }

    fn notification_header(&self, trap_oid: Oid, varbinds: Vec<VarBind>) -> Vec<VarBind> {
        let mut body = Vec::with_capacity(varbinds.len() + 3);
        body.push(VarBind::new(
            sys_uptime(),
            Value::TimeTicks(self.engine.uptime()),
        ));
        body.push(VarBind::new(
            snmp_trap_oid(),
            Value::ObjectIdentifier(trap_oid),
        ));
        body.extend(varbinds);
        body
    }

    fn require_v2c(&self) -> Result<()> {
        match self.options.version {
            Version::V2c => Ok(()),
            actual => Err(Error::VersionMismatch {
                expected: Version::V2c,
                actual,
            }),
        }
    }

    /// Turn a non-zero error status into [`Error::Snmp`].
    ///
    /// `error_index` is 1-based into the request varbinds.
    fn check(&self, response: Pdu, requested: &[Oid]) -> Result<Vec<VarBind>> {
        if let Some(status) = response.error_status()
            && status != ErrorStatus::NoError
        {
            let index = response
                .error_index()
                .and_then(|i| u32::try_from(i).ok())
                .unwrap_or(0);
            let oid = (index as usize)
                .checked_sub(1)
                .and_then(|i| requested.get(i))
                .cloned();
            tracing::debug!(target: "snmp_engine::client", { snmp.target = %self.target, %status, index }, "agent returned error status");
            return Err(Error::Snmp {
                target: self.target,
                status,
                index,
                oid,
            });
        }
        Ok(response.into_varbinds())
    }
}
