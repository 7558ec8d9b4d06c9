//! Length-prefixed frame encode/decode throughput across message sizes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use protomcp::envelope::{mcp_envelope::Payload, CallToolResponse, McpEnvelope};
use protomcp::framing::{read_envelope, write_envelope};
use std::io::Cursor;

fn envelope_with_payload(size: usize) -> McpEnvelope {
    McpEnvelope::new(1, Payload::CallToolResponse(CallToolResponse::success(vec![0u8; size])))
}

fn benchmark_frame_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_codec");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for size in [64usize, 4096, 64 * 1024, 1024 * 1024] {
        let envelope = envelope_with_payload(size);

        group.bench_function(format!("encode_{size}_bytes"), |b| {
            b.to_async(&rt).iter(|| async {
                let mut buf = Vec::new();
                write_envelope(&mut buf, black_box(&envelope)).await.unwrap();
            })
        });

        let mut encoded = Vec::new();
        rt.block_on(write_envelope(&mut encoded, &envelope)).unwrap();

        group.bench_function(format!("decode_{size}_bytes"), |b| {
            b.to_async(&rt).iter(|| async {
                let mut cursor = Cursor::new(black_box(encoded.clone()));
                let _ = read_envelope(&mut cursor, usize::MAX).await.unwrap().unwrap();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_frame_round_trip);
criterion_main!(benches);
