//! In-process fake agent for client tests.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::time::Duration;

use bytes::Bytes;

use crate::ber::{EncodeBuf, tag};
use crate::engine::EngineBuilder;
use crate::error::ErrorStatus;
use crate::message::{ClientOptions, CommunityMessage};
use crate::oid;
use crate::oid::Oid;
use crate::pdu::{CommonFields, ControlFields, Pdu, PduType};
use crate::transport::MockTransport;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

use super::Client;

pub(crate) type Mib = BTreeMap<Oid, Value>;

pub(crate) fn agent_addr() -> SocketAddr {
    "192.0.2.20:161".parse().unwrap()
}

/// system group plus a 2-row, 3-column ifTable.
pub(crate) fn sample_mib() -> Mib {
    let mut mib = Mib::new();
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("Test agent"));
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(4200));
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("core-sw1"));
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 2, 1, 0), Value::Integer(2));
    for index in 1..=2u32 {
        let entry = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1);
        mib.insert(entry.child(1).child(index), Value::Integer(index as i32));
        mib.insert(
            entry.child(2).child(index),
            Value::from(format!("eth{index}")),
        );
        mib.insert(entry.child(3).child(index), Value::Integer(6));
    }
    mib
}

/// A client whose sent datagrams are answered from `mib`.
pub(crate) fn mib_client(version: Version, mib: Mib) -> (MockTransport, Client<MockTransport>) {
    let (mock, client) = silent_client(version);
    spawn_responder(mock.clone(), move |request| answer(&mib, request));
    (mock, client)
}

/// A client whose datagrams are recorded but never answered.
pub(crate) fn silent_client(version: Version) -> (MockTransport, Client<MockTransport>) {
    let mock = MockTransport::new("0.0.0.0:40001".parse().unwrap());
    let engine = EngineBuilder::new()
        .timeout(Duration::from_secs(1))
        .request_id_seed(9)
        .build(mock.clone(), None);
    let client = engine.client(agent_addr(), ClientOptions::new(version, "public"));
    (mock, client)
}

/// Answer each sent request with whatever `respond` builds.
pub(crate) fn spawn_responder<F>(mock: MockTransport, respond: F)
where
    F: Fn(&CommunityMessage) -> Option<Pdu> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let sent = mock.next_sent().await;
            let Ok(request) = CommunityMessage::from_bytes(sent.data) else {
                continue;
            };
            let Some(response) = respond(&request) else {
                continue;
            };
            mock.inject(encode_reply(&request, &response), sent.target);
        }
    });
}

pub(crate) fn response(
    request: &CommunityMessage,
    status: ErrorStatus,
    index: i32,
    varbinds: Vec<VarBind>,
) -> Pdu {
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
pub(crate) fn encode_reply(request: &CommunityMessage, response: &Pdu) -> Bytes {
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

fn successor<'a>(mib: &'a Mib, oid: &Oid) -> Option<(&'a Oid, &'a Value)> {
    mib.range((Bound::Excluded(oid.clone()), Bound::Unbounded))
        .next()
}

fn answer(mib: &Mib, request: &CommunityMessage) -> Option<Pdu> {
    let v1 = request.version == Version::V1;
    let pdu = &request.pdu;
    let mut out = Vec::new();

    match pdu.pdu_type() {
        PduType::GetRequest => {
            for (i, vb) in pdu.varbinds().iter().enumerate() {
                match mib.get(&vb.oid) {
                    Some(value) => out.push(VarBind::new(vb.oid.clone(), value.clone())),
                    None if v1 => {
                        return Some(response(
                            request,
                            ErrorStatus::NoSuchName,
                            i as i32 + 1,
                            pdu.varbinds().to_vec(),
                        ));
                    }
                    None => out.push(VarBind::new(vb.oid.clone(), Value::NoSuchObject)),
                }
            }
        }
        PduType::GetNextRequest => {
            for (i, vb) in pdu.varbinds().iter().enumerate() {
                match successor(mib, &vb.oid) {
                    Some((oid, value)) => out.push(VarBind::new(oid.clone(), value.clone())),
                    None if v1 => {
                        return Some(response(
                            request,
                            ErrorStatus::NoSuchName,
                            i as i32 + 1,
                            pdu.varbinds().to_vec(),
                        ));
                    }
                    None => out.push(VarBind::new(vb.oid.clone(), Value::EndOfMibView)),
                }
            }
        }
        PduType::GetBulkRequest => {
            let fields = pdu.common_fields()?;
            let non_repeaters = fields.error_status.max(0) as usize;
            let max_repetitions = fields.error_index.max(0) as usize;
            let (singles, repeaters) = pdu
                .varbinds()
                .split_at(non_repeaters.min(pdu.varbinds().len()));
            for vb in singles {
                if let Some((oid, value)) = successor(mib, &vb.oid) {
                    out.push(VarBind::new(oid.clone(), value.clone()));
                }
            }
            let mut cursors: Vec<Oid> = repeaters.iter().map(|vb| vb.oid.clone()).collect();
            for _ in 0..max_repetitions {
                for cursor in &mut cursors {
                    match successor(mib, cursor) {
                        Some((oid, value)) => {
                            out.push(VarBind::new(oid.clone(), value.clone()));
                            *cursor = oid.clone();
                        }
                        None => out.push(VarBind::new(cursor.clone(), Value::EndOfMibView)),
                    }
                }
            }
        }
        PduType::SetRequest | PduType::InformRequest => out = pdu.varbinds().to_vec(),
        _ => return None,
    }

    Some(response(request, ErrorStatus::NoError, 0, out))
}
