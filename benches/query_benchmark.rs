//! Benchmarks for the query engine and store snapshots.
//!
//! Filtering runs on every keystroke after the debounce window, so a full
//! pass over a store at capacity has to stay well inside a frame budget.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use traffic_inspector::models::{HttpMethod, RequestRecord, ResponseRecord, Transaction};
use traffic_inspector::query::{Filter, QueryEngine};
use traffic_inspector::store::{InMemoryTransactionStore, TransactionStore};

/// Generate `count` completed transactions across a handful of endpoints.
fn generate_transactions(count: usize) -> Vec<Arc<Transaction>> {
    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    (0..count)
        .map(|i| {
            let method = match i % 4 {
                0 => HttpMethod::GET,
                1 => HttpMethod::POST,
                2 => HttpMethod::PUT,
                _ => HttpMethod::DELETE,
            };
            let status = match i % 7 {
                0 => 404,
                1 => 500,
                _ => 200,
            };
            // Every fifth call shares a timestamp with its neighbour to exercise tie-breaking.
            let start = base + Duration::milliseconds((i - i % 5) as i64);
            let request = RequestRecord::new(
                method,
                format!("https://api.example.com/resource/{}/items?page={}", i % 50, i),
            );
            Arc::new(
                Transaction::started_at(format!("tx-{:06}", i), request, start)
                    .complete_at(ResponseRecord::new(status, ""), start),
            )
        })
        .collect()
}

fn bench_filter_match_all(c: &mut Criterion) {
    let engine = QueryEngine::new();
    let mut group = c.benchmark_group("filter_match_all");

    for size in [100usize, 1_000, 10_000].iter() {
        let snapshot = generate_transactions(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| engine.filter(black_box(snapshot), black_box(&Filter::default())))
        });
    }

    group.finish();
}

fn bench_filter_search(c: &mut Criterion) {
    let engine = QueryEngine::new();
    let snapshot = generate_transactions(1_000);
    let filter = Filter::default()
        .with_method(HttpMethod::GET)
        .with_search("RESOURCE/4");

    c.bench_function("filter_search_1000", |b| {
        b.iter(|| engine.filter(black_box(&snapshot), black_box(&filter)))
    });
}

fn bench_store_snapshot(c: &mut Criterion) {
    let store = InMemoryTransactionStore::with_capacity(1_000);
    for tx in generate_transactions(1_000) {
        store.append(Transaction::clone(&tx)).unwrap();
    }

    c.bench_function("store_snapshot_1000", |b| {
        b.iter(|| black_box(store.snapshot().unwrap()))
    });
}

criterion_group!(
    benches,
    bench_filter_match_all,
    bench_filter_search,
    bench_store_snapshot
);
criterion_main!(benches);
