//! Property-based tests for the codec and the public parsers.

use bytes::Bytes;
use proptest::prelude::*;
use snmp_wire::ber::{Decoder, EncodeBuf};
use snmp_wire::message::{
    build_get_request, build_get_response, build_set_request, parse_request, parse_response,
};
use snmp_wire::oid::Oid;
use snmp_wire::value::Value;
use snmp_wire::version::Version;

/// OIDs that survive a BER round trip: first arc 0-2, second arc below 40
/// unless the first is 2, every arc below 2^32.
fn arb_oid() -> impl Strategy<Value = Oid> {
    (0u64..=2, any::<u32>(), prop::collection::vec(any::<u32>(), 0..=20)).prop_map(
        |(arc1, arc2, rest)| {
            let arc2 = if arc1 < 2 {
                u64::from(arc2 % 40)
            } else {
                u64::from(arc2)
            };
            let mut arcs = vec![arc1, arc2];
            arcs.extend(rest.into_iter().map(u64::from));
            Oid::from_slice(&arcs)
        },
    )
}

fn arb_version() -> impl Strategy<Value = Version> {
    prop_oneof![Just(Version::V1), Just(Version::V2c)]
}

fn arb_community() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=32)
}

proptest! {
    #[test]
    fn oid_ber_roundtrip(oid in arb_oid()) {
        let encoded = oid.to_ber();
        let decoded = Oid::from_ber(&encoded).unwrap();
        prop_assert_eq!(&decoded, &oid);
        prop_assert_eq!(decoded.to_ber(), encoded);
    }

    /// Any arcs below 2^32, including fewer than two arcs and first/second
    /// arcs that don't split back the same way, re-encode to the same bytes.
    #[test]
    fn oid_ber_reencodes_identically(arcs in prop::collection::vec(0u64..(1u64 << 32), 0..20)) {
        let encoded = Oid::from_slice(&arcs).to_ber();
        let decoded = Oid::from_ber(&encoded).unwrap();
        prop_assert_eq!(decoded.to_ber(), encoded);
    }

    #[test]
    fn oid_text_roundtrip(oid in arb_oid()) {
        prop_assert_eq!(Oid::parse(&oid.to_string()).unwrap(), oid);
    }

    #[test]
    fn integer_roundtrip(n in any::<i32>()) {
        let mut buf = EncodeBuf::new();
        Value::Integer(i64::from(n)).encode(&mut buf);
        let mut decoder = Decoder::new(buf.finish());
        prop_assert_eq!(Value::decode(&mut decoder).unwrap(), Value::Integer(i64::from(n)));
        prop_assert!(decoder.is_empty());
    }

    #[test]
    fn get_request_parses_back(
        version in arb_version(),
        request_id in 1u32..=i32::MAX as u32,
        community in arb_community(),
        oids in prop::collection::vec(arb_oid(), 1..=8),
    ) {
        let data = build_get_request(version, request_id, &community, &oids);
        let request = parse_request(data).unwrap();

        prop_assert_eq!(request.version(), version);
        prop_assert_eq!(request.request_id(), request_id);
        prop_assert_eq!(&request.community()[..], &community[..]);
        prop_assert_eq!(request.oids(), oids);
    }

    #[test]
    fn set_request_parses_back(
        request_id in 1u32..=i32::MAX as u32,
        oid in arb_oid(),
        value in prop::collection::vec(any::<u8>(), 0..=64),
    ) {
        let data = build_set_request(Version::V2c, request_id, b"private", &[(oid.clone(), Bytes::from(value.clone()))]);
        match parse_request(data).unwrap() {
            snmp_wire::Request::Set { bindings, .. } => {
                prop_assert_eq!(bindings.len(), 1);
                prop_assert_eq!(&bindings[0].oid, &oid);
                prop_assert!(bindings[0].is_octet_string());
                prop_assert_eq!(&bindings[0].data[..], &value[..]);
            }
            other => prop_assert!(false, "expected SET, got {:?}", other),
        }
    }

    #[test]
    fn response_parses_back(
        version in arb_version(),
        request_id in 1u32..=i32::MAX as u32,
        entries in prop::collection::vec((arb_oid(), prop::option::of("[a-z0-9 ]{0,16}")), 0..=8),
    ) {
        let results: Vec<(Oid, Option<Value>)> = entries
            .iter()
            .map(|(oid, text)| (oid.clone(), text.as_deref().map(Value::from)))
            .collect();
        let data = build_get_response(version, request_id, b"public", &results);
        let response = parse_response(data, Some(request_id)).unwrap();

        prop_assert_eq!(response.version, version);
        prop_assert_eq!(response.varbinds.len(), results.len());
        for (vb, (oid, value)) in response.varbinds.iter().zip(&results) {
            prop_assert_eq!(&vb.oid, oid);
            prop_assert_eq!(&vb.value, value.as_ref().unwrap_or(&Value::Null));
        }
    }

    #[test]
    fn parsers_never_panic(data in prop::collection::vec(any::<u8>(), 0..=512)) {
        let data = Bytes::from(data);
        let _ = parse_request(data.clone());
        let _ = parse_response(data.clone(), None);
        let _ = snmp_wire::message::extract_request_id(&data);
        let _ = Oid::from_ber(&data);
    }

    #[test]
    fn truncated_requests_are_rejected(
        oids in prop::collection::vec(arb_oid(), 1..=4),
        cut in any::<prop::sample::Index>(),
    ) {
        let data = build_get_request(Version::V2c, 42, b"public", &oids);
        let len = cut.index(data.len());
        prop_assert!(parse_request(data.slice(..len)).is_none());
    }
}
