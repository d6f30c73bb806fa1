use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use blockdex::index::{intersect, union, PostingList};

/// Every `step`-th id below `limit`, optionally with skips built
fn make_list(limit: u32, step: u32, skips: bool) -> PostingList {
    let mut list: PostingList = (0..limit).step_by(step as usize).collect();
    if skips {
        list.build_skip();
    }
    list
}

fn bench_intersect(c: &mut Criterion) {
    let sizes = [10_000u32, 100_000, 1_000_000];

    let mut group = c.benchmark_group("intersect");
    for &size in &sizes {
        // Dense list against a sparse one, where skips pay off
        let dense_plain = make_list(size, 2, false);
        let sparse_plain = make_list(size, 97, false);
        let dense_skips = make_list(size, 2, true);
        let sparse_skips = make_list(size, 97, true);

        group.bench_with_input(BenchmarkId::new("plain", size), &size, |b, _| {
            b.iter(|| black_box(intersect(&dense_plain, &sparse_plain)));
        });
        group.bench_with_input(BenchmarkId::new("skips", size), &size, |b, _| {
            b.iter(|| black_box(intersect(&dense_skips, &sparse_skips)));
        });
    }
    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let sizes = [10_000u32, 100_000];

    let mut group = c.benchmark_group("union");
    for &size in &sizes {
        let evens = make_list(size, 2, false);
        let thirds = make_list(size, 3, false);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(union(&evens, &thirds)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_intersect, bench_union);
criterion_main!(benches);
