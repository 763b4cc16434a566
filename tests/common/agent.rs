//! Loopback fake agent answering from an in-memory MIB.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use snmp_engine::ber::{EncodeBuf, tag};
use snmp_engine::pdu::{CommonFields, ControlFields};
use snmp_engine::{CommunityMessage, ErrorStatus, Oid, Pdu, PduType, Value, VarBind, Version};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Agent knobs.
#[derive(Debug, Clone, Default)]
pub struct AgentBehavior {
    /// Silently drop this many requests before answering.
    pub drop_first: usize,
    /// Answer only requests carrying this community; `None` answers all.
    pub community: Option<&'static str>,
}

pub struct FakeAgent {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl FakeAgent {
    pub async fn start(mib: BTreeMap<Oid, Value>) -> Self {
        Self::start_with(mib, AgentBehavior::default()).await
    }

    pub async fn start_with(mib: BTreeMap<Oid, Value>, behavior: AgentBehavior) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&requests);

        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 65535];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= behavior.drop_first {
                    continue;
                }
                let Ok(request) =
                    CommunityMessage::from_bytes(Bytes::copy_from_slice(&buf[..len]))
                else {
                    continue;
                };
                if let Some(community) = behavior.community
                    && request.community.as_ref() != community.as_bytes()
                {
                    continue;
                }
                let Some(response) = answer(&mib, &request) else {
                    continue;
                };
                let _ = socket.send_to(&encode_reply(&request, &response), peer).await;
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Datagrams received so far, answered or not.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for FakeAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A bound socket that never answers.
pub async fn black_hole() -> (UdpSocket, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    (socket, addr)
}

fn response(request: &CommunityMessage, status: ErrorStatus, index: i32, varbinds: Vec<VarBind>) -> Pdu {
    let fields = CommonFields {
        request_id: request.pdu.request_id().unwrap(),
        error_status: status.as_i32(),
        error_index: index,
    };
    Pdu::from_fields(PduType::Response, ControlFields::Common(fields), varbinds).unwrap()
}

/// Agent-side encoding of a Response.
///
/// Exception markers go out as empty context-specific tags; the manager-side
/// value codec refuses to produce them.
fn encode_reply(request: &CommunityMessage, response: &Pdu) -> Bytes {
    let fields = response.common_fields().unwrap();
    let mut buf = EncodeBuf::new();
    buf.push_sequence(|buf| {
        buf.push_constructed(tag::pdu::RESPONSE, |buf| {
            buf.push_sequence(|buf| {
                for vb in response.varbinds().iter().rev() {
                    buf.push_sequence(|buf| {
                        if vb.value.is_exception() {
                            buf.push_length(0);
                            buf.push_tag(vb.value.value_type().tag());
                        } else {
                            vb.value.encode(buf).unwrap();
                        }
                        buf.push_oid(&vb.oid);
                    });
                }
            });
            buf.push_integer(fields.error_index);
            buf.push_integer(fields.error_status);
            buf.push_integer(fields.request_id);
        });
        buf.push_octet_string(&request.community);
        buf.push_integer(request.version.as_i32());
    });
    buf.finish()
}

fn successor<'a>(mib: &'a BTreeMap<Oid, Value>, oid: &Oid) -> Option<(&'a Oid, &'a Value)> {
    mib.range((Bound::Excluded(oid.clone()), Bound::Unbounded))
        .next()
}

fn answer(mib: &BTreeMap<Oid, Value>, request: &CommunityMessage) -> Option<Pdu> {
    let v1 = request.version == Version::V1;
    let pdu = &request.pdu;
    let mut out = Vec::new();

    match pdu.pdu_type() {
        PduType::GetRequest | PduType::GetNextRequest => {
            let next = pdu.pdu_type() == PduType::GetNextRequest;
            for (i, vb) in pdu.varbinds().iter().enumerate() {
                let found = if next {
                    successor(mib, &vb.oid).map(|(o, v)| (o.clone(), v.clone()))
                } else {
                    mib.get(&vb.oid).map(|v| (vb.oid.clone(), v.clone()))
                };
                match found {
                    Some((oid, value)) => out.push(VarBind::new(oid, value)),
                    None if v1 => {
                        return Some(response(
                            request,
                            ErrorStatus::NoSuchName,
                            i as i32 + 1,
                            pdu.varbinds().to_vec(),
                        ));
                    }
                    None if next => out.push(VarBind::new(vb.oid.clone(), Value::EndOfMibView)),
                    None => out.push(VarBind::new(vb.oid.clone(), Value::NoSuchObject)),
                }
            }
        }
        PduType::GetBulkRequest => {
            let fields = pdu.common_fields()?;
            let max_repetitions = fields.error_index.max(0) as usize;
            let mut cursors: Vec<Oid> = pdu.varbinds().iter().map(|vb| vb.oid.clone()).collect();
            for _ in 0..max_repetitions {
                for cursor in &mut cursors {
                    if let Some((oid, value)) = successor(mib, cursor) {
                        out.push(VarBind::new(oid.clone(), value.clone()));
                        *cursor = oid.clone();
                    }
                }
            }
        }
        PduType::SetRequest | PduType::InformRequest => out = pdu.varbinds().to_vec(),
        _ => return None,
    }

    Some(response(request, ErrorStatus::NoError, 0, out))
}
