use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;

use bluesky_enricher::enricher::DedupCache;
use bluesky_enricher::limiter::{estimate_tokens, QuotaConfig, SlidingWindowLimiter};

fn bench_record_and_usage(c: &mut Criterion) {
    // Short window so the deque evicts as fast as the bench fills it.
    let config = QuotaConfig::new(
        200_000,
        Duration::from_millis(100),
        Duration::from_secs(5),
    )
    .unwrap();
    let limiter = SlidingWindowLimiter::new(config);

    c.bench_function("record_and_usage", |b| {
        b.iter(|| {
            limiter.record(black_box(750));
            black_box(limiter.current_usage())
        })
    });
}

fn bench_dedup_check(c: &mut Criterion) {
    let cache = DedupCache::new(Duration::from_secs(3_600));
    for i in 0..10_000 {
        cache.check_and_insert(&format!("handle-{}.bsky.social", i));
    }

    c.bench_function("dedup_check", |b| {
        b.iter(|| cache.check_and_insert(black_box("handle-5000.bsky.social")))
    });
}

fn bench_estimate_tokens(c: &mut Criterion) {
    let prompt = "Display Name: Example Account; Description: writer, podcaster, \
                  occasional streamer posting about books and media criticism; \
                  Handle: example.bsky.social"
        .repeat(8);

    c.bench_function("estimate_tokens", |b| {
        b.iter(|| estimate_tokens(black_box(&prompt)))
    });
}

criterion_group!(
    benches,
    bench_record_and_usage,
    bench_dedup_check,
    bench_estimate_tokens
);
criterion_main!(benches);
