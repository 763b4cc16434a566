use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::*;
use crate::oid;
use crate::oid::Oid;
use crate::pdu::{CommonFields, ControlFields, PduType};
use crate::transport::{MockTransport, SentDatagram};
use crate::value::Value;
use crate::varbind::VarBind;

const TIMEOUT: Duration = Duration::from_secs(1);

fn agent() -> SocketAddr {
    "192.0.2.10:161".parse().unwrap()
}

fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}

fn start(mock: &MockTransport, retries: u32) -> Engine<MockTransport> {
    EngineBuilder::new()
        .retries(retries)
        .timeout(TIMEOUT)
        .request_id_seed(1)
        .build(mock.clone(), None)
}

fn spawn_get(engine: &Engine<MockTransport>) -> tokio::task::JoinHandle<Result<Pdu>> {
    let engine = engine.clone();
    tokio::spawn(async move {
        engine
            .request(
                agent(),
                &ClientOptions::default(),
                Pdu::get_request(0, &[sys_descr()]),
            )
            .await
    })
}

fn request_id_of(sent: &SentDatagram) -> i32 {
    CommunityMessage::from_bytes(sent.data.clone())
        .unwrap()
        .pdu
        .request_id()
        .unwrap()
}

fn response_with_id(request_id: i32, varbinds: Vec<VarBind>) -> Bytes {
    let pdu = Pdu::from_fields(
        PduType::Response,
        ControlFields::Common(CommonFields::new(request_id)),
        varbinds,
    )
    .unwrap();
    CommunityMessage::with_options(&ClientOptions::default(), pdu)
        .encode()
        .unwrap()
}

fn response_for(sent: &SentDatagram, varbinds: Vec<VarBind>) -> Bytes {
    response_with_id(request_id_of(sent), varbinds)
}

/// Let every runnable task reach idle.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_request_completes_on_matching_response() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 0);
    let handle = spawn_get(&engine);

    let sent = mock.next_sent().await;
    assert_eq!(sent.target, agent());
    mock.inject(
        response_for(&sent, vec![VarBind::new(sys_descr(), Value::from("router"))]),
        agent(),
    );

    let pdu = handle.await.unwrap().unwrap();
    assert_eq!(pdu.pdu_type(), PduType::Response);
    assert_eq!(pdu.varbinds()[0].value.as_str(), Some("router"));

    let stats = engine.stats();
    assert_eq!(stats.sent, 1);
    assert_eq!(stats.received, 1);
    assert_eq!(stats.timeouts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_retries_then_timeout() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 2);
    let started = Instant::now();
    let handle = spawn_get(&engine);

    let first = mock.next_sent().await;
    let second = mock.next_sent().await;
    let third = mock.next_sent().await;
    // every attempt carries the same datagram
    assert_eq!(first.data, second.data);
    assert_eq!(second.data, third.data);

    let err = handle.await.unwrap().unwrap_err();
    match err {
        Error::Timeout {
            target,
            elapsed,
            retries,
            request_id,
        } => {
            assert_eq!(target, agent());
            assert!(elapsed >= TIMEOUT * 3);
            assert_eq!(retries, 2);
            assert_eq!(request_id, request_id_of(&first));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(started.elapsed() >= TIMEOUT * 3);
    assert!(mock.try_next_sent().is_none());

    let stats = engine.stats();
    assert_eq!(stats.sent, 3);
    assert_eq!(stats.timeouts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_response_after_timeout_counts_as_late() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 0);
    let handle = spawn_get(&engine);

    let sent = mock.next_sent().await;
    assert!(matches!(
        handle.await.unwrap(),
        Err(Error::Timeout { .. })
    ));

    mock.inject(response_for(&sent, vec![]), agent());
    settle().await;
    assert_eq!(engine.stats().late_responses, 1);
}

#[tokio::test(start_paused = true)]
async fn test_garbage_is_counted_and_request_survives() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 0);
    let handle = spawn_get(&engine);

    let sent = mock.next_sent().await;
    mock.inject(Bytes::from_static(b"\x30\x03\x02\x01"), agent());
    mock.inject(Bytes::from_static(b"not snmp at all"), agent());
    settle().await;
    assert_eq!(engine.stats().malformed, 2);

    mock.inject(response_for(&sent, vec![VarBind::null(sys_descr())]), agent());
    assert!(handle.await.unwrap().is_ok());
    assert_eq!(engine.stats().received, 3);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_request_id_is_late_then_right_one_completes() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 0);
    let handle = spawn_get(&engine);

    let sent = mock.next_sent().await;
    let id = request_id_of(&sent);
    mock.inject(response_with_id(id.wrapping_add(1), vec![]), agent());
    settle().await;
    assert_eq!(engine.stats().late_responses, 1);

    mock.inject(response_with_id(id, vec![]), agent());
    let pdu = handle.await.unwrap().unwrap();
    assert_eq!(pdu.request_id(), Some(id));
}

#[tokio::test(start_paused = true)]
async fn test_response_from_other_source_still_completes() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 0);
    let handle = spawn_get(&engine);

    let sent = mock.next_sent().await;
    mock.inject(response_for(&sent, vec![]), "192.0.2.99:161".parse().unwrap());
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_is_not_retried() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    mock.fail_sends(true);
    let engine = start(&mock, 3);

    let err = spawn_get(&engine).await.unwrap().unwrap_err();
    assert!(matches!(err, Error::SendFailure { target, .. } if target == agent()));

    tokio::time::sleep(TIMEOUT * 5).await;
    let stats = engine.stats();
    assert_eq!(stats.send_failures, 1);
    assert_eq!(stats.sent, 0);
    assert_eq!(stats.timeouts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_request_stops_retrying() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 3);
    let handle = spawn_get(&engine);

    mock.next_sent().await;
    handle.abort();
    tokio::time::sleep(TIMEOUT * 5).await;

    assert!(mock.try_next_sent().is_none());
    let stats = engine.stats();
    assert_eq!(stats.sent, 1);
    assert_eq!(stats.timeouts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_get_distinct_ids() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 0);
    let first = spawn_get(&engine);
    let second = spawn_get(&engine);

    let a = mock.next_sent().await;
    let b = mock.next_sent().await;
    assert_ne!(request_id_of(&a), request_id_of(&b));

    // answer out of order
    mock.inject(response_for(&b, vec![]), agent());
    mock.inject(response_for(&a, vec![]), agent());
    assert_eq!(
        first.await.unwrap().unwrap().request_id(),
        Some(request_id_of(&a))
    );
    assert_eq!(
        second.await.unwrap().unwrap().request_id(),
        Some(request_id_of(&b))
    );
}

#[tokio::test(start_paused = true)]
async fn test_unsolicited_messages_dispatch_by_socket() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let trap = MockTransport::new("0.0.0.0:40162".parse().unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = EngineBuilder::new()
        .timeout(TIMEOUT)
        .handler(Role::Trap, move |message: CommunityMessage, source| {
            let _ = tx.send((message, source));
        })
        .build(mock.clone(), Some(trap.clone()));
    assert_eq!(engine.trap_addr(), Some("0.0.0.0:40162".parse().unwrap()));

    let notification = Pdu::trap_v2(
        77,
        vec![VarBind::new(
            oid!(1, 3, 6, 1, 2, 1, 1, 3, 0),
            Value::TimeTicks(100),
        )],
    );
    let data = CommunityMessage::with_options(&ClientOptions::default(), notification)
        .encode()
        .unwrap();
    trap.inject(data, agent());

    let (message, source) = rx.recv().await.unwrap();
    assert_eq!(source, agent());
    assert_eq!(message.pdu.pdu_type(), PduType::TrapV2);
    assert_eq!(message.pdu.request_id(), Some(77));

    // no agent-side handler registered
    let get = CommunityMessage::with_options(
        &ClientOptions::default(),
        Pdu::get_request(5, &[sys_descr()]),
    );
    mock.inject(get.encode().unwrap(), agent());
    settle().await;
    assert_eq!(engine.stats().unhandled, 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_notify_sends_once_untracked() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 2);
    let message = CommunityMessage::with_options(
        &ClientOptions::default(),
        Pdu::trap_v2(0, vec![VarBind::null(sys_descr())]),
    );
    engine.notify(agent(), message).await.unwrap();

    let sent = mock.next_sent().await;
    let decoded = CommunityMessage::from_bytes(sent.data).unwrap();
    assert_eq!(decoded.pdu.pdu_type(), PduType::TrapV2);

    tokio::time::sleep(TIMEOUT * 5).await;
    assert!(mock.try_next_sent().is_none());
    assert_eq!(engine.stats().sent, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_pdu_rejected_as_request() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 0);
    let err = engine
        .request(agent(), &ClientOptions::default(), Pdu::trap_v2(0, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NotConfirmed {
            pdu_type: PduType::TrapV2
        }
    ));
    assert!(mock.try_next_sent().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_close_fails_pending_and_later_requests() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 0);
    let handle = spawn_get(&engine);
    mock.next_sent().await;

    engine.close().await;
    assert!(matches!(handle.await.unwrap(), Err(Error::Closed)));
    assert!(matches!(spawn_get(&engine).await.unwrap(), Err(Error::Closed)));
}

#[tokio::test(start_paused = true)]
async fn test_uptime_tracks_engine_start() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    let engine = start(&mock, 0);
    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(engine.uptime(), 300);
}

#[tokio::test(start_paused = true)]
async fn test_receive_errors_back_off_then_recover() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    mock.fail_recvs(5);
    let started = Instant::now();
    let engine = start(&mock, 0);
    let handle = spawn_get(&engine);

    let sent = mock.next_sent().await;
    mock.inject(response_for(&sent, vec![]), agent());

    let response = handle.await.unwrap().unwrap();
    assert_eq!(response.request_id(), Some(request_id_of(&sent)));
    assert_eq!(mock.recv_failures(), 5);
    // 10 + 20 + 40 + 80 + 160 ms of backoff before the reply was read
    assert!(started.elapsed() >= Duration::from_millis(310));
}

#[tokio::test(start_paused = true)]
async fn test_persistent_receive_errors_do_not_spin() {
    let mock = MockTransport::new("0.0.0.0:40000".parse().unwrap());
    mock.fail_recvs(usize::MAX);
    let _engine = start(&mock, 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let failures = mock.recv_failures();
    // backoff doubles up to one second
    assert!((10..=20).contains(&failures), "{failures} receive attempts");
}
