use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use genoview_core::layout::{coverage, pack_rows};
use genoview_core::spatial::IntervalIndex;
use genoview_core::Span;

/// Read-like spans: fixed length, pseudo-random starts over `window` bases.
fn generate_spans(count: usize, window: u64, len: u64) -> Vec<Span> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let start = state % window;
            Span::new(start, start + len)
        })
        .collect()
}

fn bench_interval_query(c: &mut Criterion) {
    let spans = generate_spans(100_000, 5_000_000, 150);
    let index = IntervalIndex::build(spans.iter().copied());

    c.bench_function("index_query_25kb", |b| {
        b.iter(|| {
            let hits = index.query(black_box(Span::new(2_500_000, 2_525_000)));
            black_box(hits)
        })
    });

    c.bench_function("index_nearest_1px", |b| {
        b.iter(|| black_box(index.nearest(black_box(Span::new(2_500_000, 2_500_032)), 2_500_016)))
    });
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    for count in [1_000usize, 20_000, 200_000] {
        let spans = generate_spans(count, 5_000_000, 150);
        group.bench_with_input(BenchmarkId::from_parameter(count), &spans, |b, spans| {
            b.iter(|| black_box(IntervalIndex::build(spans.iter().copied())))
        });
    }
    group.finish();
}

fn bench_pack_rows(c: &mut Criterion) {
    let spans = generate_spans(5_000, 25_000, 150);
    c.bench_function("pack_rows_5k_reads", |b| {
        b.iter(|| black_box(pack_rows(black_box(&spans), 1, 200)))
    });
}

fn bench_coverage(c: &mut Criterion) {
    let spans = generate_spans(50_000, 1_000_000, 150);
    let window = Span::new(0, 1_000_000);
    let mut group = c.benchmark_group("coverage");
    for bin in [32u64, 1_250] {
        group.bench_with_input(BenchmarkId::new("bin", bin), &bin, |b, &bin| {
            b.iter(|| black_box(coverage(black_box(&spans), window, bin)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_interval_query,
    bench_index_build,
    bench_pack_rows,
    bench_coverage
);
criterion_main!(benches);
