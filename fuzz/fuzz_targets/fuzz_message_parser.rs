#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_engine::ber::Decoder;
use snmp_engine::message::{CommunityMessage, peek_request_id};
use snmp_engine::pdu::Pdu;

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // the shallow scan must agree with a full decode whenever both succeed
    let peeked = peek_request_id(data);
    if let Ok(message) = CommunityMessage::from_bytes(bytes.clone())
        && let Some(id) = message.pdu.request_id()
    {
        assert_eq!(peeked, Some(id));
    }

    let mut decoder = Decoder::new(bytes);
    let _ = Pdu::decode(&mut decoder);
});
