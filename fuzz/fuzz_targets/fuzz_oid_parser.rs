#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_engine::oid::Oid;

fuzz_target!(|data: &[u8]| {
    // content octets, as found after an OBJECT IDENTIFIER tag
    let _ = Oid::from_ber(data);

    // dotted notation from CLI arguments
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = Oid::parse(s);
    }
});
