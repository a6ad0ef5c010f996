#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_wire::message::{CommunityMessage, extract_request_id, parse_request, parse_response};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // Agent side
    let _ = parse_request(bytes.clone());

    // Client side, with and without request-id enforcement
    let _ = parse_response(bytes.clone(), None);
    if let Some(id) = extract_request_id(data) {
        let _ = parse_response(bytes.clone(), Some(id));
    }

    // Re-encoding a decoded message must not panic either
    if let Ok(msg) = CommunityMessage::decode(bytes) {
        let _ = msg.encode();
    }
});
