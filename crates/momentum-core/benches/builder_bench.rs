//! Benchmarks for the candle builder.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use momentum_core::{build_candles, merge_all, Entity, Period, ScoreEvent, MINUTE_MS};

fn generate_events(count: usize) -> Vec<ScoreEvent> {
    (0..count)
        .map(|i| {
            // Irregular spacing and mixed signs, shuffled out of order
            let t = ((i * 7919) % count) as i64 * 37_000;
            let value = ((i as f64) * 0.3).sin() * 5.0;
            ScoreEvent::new(value, t)
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_candles");

    for size in [100, 1_000, 10_000] {
        let events = generate_events(size);
        let now = events.iter().map(|e| e.occurred_at).max().unwrap_or(0) + MINUTE_MS;
        group.throughput(Throughput::Elements(size as u64));

        for period in [Period::Min1, Period::Hour1, Period::All] {
            group.bench_with_input(BenchmarkId::new(period.code(), size), &events, |b, events| {
                b.iter(|| build_candles(black_box(events), period, now))
            });
        }
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let live: Vec<Entity> = (0..20)
        .map(|i| Entity::new(i.to_string(), format!("dir {i}")).with_events(generate_events(500)))
        .collect();
    let deleted: Vec<Entity> = (15..30)
        .map(|i| Entity::new(i.to_string(), format!("old {i}")).with_events(generate_events(200)))
        .collect();

    c.bench_function("merge_all", |b| b.iter(|| merge_all(black_box(&live), black_box(&deleted))));
}

criterion_group!(benches, bench_build, bench_merge);
criterion_main!(benches);
