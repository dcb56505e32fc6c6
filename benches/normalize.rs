//! Envelope normalization throughput for list responses of growing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use salesdesk::envelope::normalize_json;
use serde_json::{json, Value};

fn entry(id: usize) -> Value {
    json!({
        "id": id,
        "attributes": {
            "name": format!("Customer {id}"),
            "phone": "010-0000-0000",
            "region": {"data": {"id": id % 17, "attributes": {"name": "Seoul"}}},
            "contacts": {"data": [
                {"id": id * 10, "attributes": {"email": "a@example.test"}},
                {"id": id * 10 + 1, "attributes": {"email": "b@example.test"}}
            ]},
            "manager": {"data": {"id": 3, "attributes": {"name": "Park", "team": "East"}}},
            "moreinfo": {"data": {"id": id, "attributes": {"memo": "", "tier": "gold"}}}
        }
    })
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope/normalize_json");
    for size in [1usize, 25, 100, 1000] {
        let body = json!({ "data": (0..size).map(entry).collect::<Vec<_>>() });
        group.bench_with_input(BenchmarkId::from_parameter(size), &body, |b, body| {
            b.iter(|| normalize_json(black_box(body)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
