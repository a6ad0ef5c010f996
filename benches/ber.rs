//! Codec benchmarks: OIDs, values and whole messages.

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use snmp_wire::ber::{Decoder, EncodeBuf};
use snmp_wire::message::{build_get_request, build_get_response, parse_request, parse_response};
use snmp_wire::oid::Oid;
use snmp_wire::value::Value;
use snmp_wire::version::Version;
use std::hint::black_box;

fn common_oids() -> Vec<(&'static str, Oid)> {
    vec![
        ("sysDescr", Oid::from_slice(&[1, 3, 6, 1, 2, 1, 1, 1, 0])),
        ("ifIndex", Oid::from_slice(&[1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 1])),
        (
            "long_oid",
            Oid::from_slice(&[1, 3, 6, 1, 4, 1, 9, 9, 42, 1, 2, 3, 4, 5, 6, 7]),
        ),
    ]
}

fn bench_oid(c: &mut Criterion) {
    let mut group = c.benchmark_group("oid");

    for (name, oid) in common_oids() {
        let encoded = oid.to_ber();
        let text = oid.to_string();
        group.bench_with_input(BenchmarkId::new("to_ber", name), &oid, |b, oid| {
            b.iter(|| black_box(oid.to_ber()))
        });
        group.bench_with_input(BenchmarkId::new("from_ber", name), &encoded, |b, data| {
            b.iter(|| black_box(Oid::from_ber(data).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("parse", name), &text, |b, s| {
            b.iter(|| black_box(Oid::parse(s).unwrap()))
        });
    }

    group.finish();
}

fn bench_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("value");

    let values = [
        ("integer", Value::Integer(-123_456)),
        ("octet_string", Value::from("Linux router 6.1.0 x86_64")),
        ("null", Value::Null),
        ("oid", Value::ObjectIdentifier(common_oids()[2].1.clone())),
    ];

    for (name, value) in values {
        let mut buf = EncodeBuf::new();
        value.encode(&mut buf);
        let encoded = buf.finish();

        group.bench_with_input(BenchmarkId::new("encode", name), &value, |b, value| {
            b.iter(|| {
                let mut buf = EncodeBuf::new();
                value.encode(&mut buf);
                black_box(buf.finish())
            })
        });
        group.bench_with_input(BenchmarkId::new("decode", name), &encoded, |b, data| {
            b.iter(|| {
                let mut decoder = Decoder::new(data.clone());
                black_box(Value::decode(&mut decoder).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_messages(c: &mut Criterion) {
    let mut group = c.benchmark_group("message");

    for count in [1usize, 10, 50] {
        let oids: Vec<Oid> = (0..count as u64)
            .map(|i| Oid::from_slice(&[1, 3, 6, 1, 2, 1, 2, 2, 1, 2, i]))
            .collect();
        let results: Vec<(Oid, Option<Value>)> = oids
            .iter()
            .map(|oid| (oid.clone(), Some(Value::from("GigabitEthernet0/1"))))
            .collect();

        let request = build_get_request(Version::V2c, 1234, b"public", &oids);
        let response = build_get_response(Version::V2c, 1234, b"public", &results);

        group.throughput(Throughput::Bytes(response.len() as u64));
        group.bench_with_input(BenchmarkId::new("build_get_request", count), &oids, |b, oids| {
            b.iter(|| black_box(build_get_request(Version::V2c, 1234, b"public", oids)))
        });
        group.bench_with_input(BenchmarkId::new("parse_request", count), &request, |b, data| {
            b.iter(|| black_box(parse_request(data.clone()).unwrap()))
        });
        group.bench_with_input(
            BenchmarkId::new("parse_response", count),
            &response,
            |b, data: &Bytes| b.iter(|| black_box(parse_response(data.clone(), Some(1234)).unwrap())),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_oid, bench_value, bench_messages);
criterion_main!(benches);
