use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use arbor_tree::{TreeBuilder, TreeConfig};
use arbor_types::{CommitmentLeaf, FieldElement};

fn leaves(count: u64) -> Vec<CommitmentLeaf> {
    (0..count)
        .map(|i| CommitmentLeaf::new(i, FieldElement::from_u64(i * 7 + 1), i))
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_h32");
    for count in [16u64, 256, 1024] {
        let input = leaves(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            let mut builder = TreeBuilder::poseidon(TreeConfig::default()).unwrap();
            b.iter(|| builder.build(black_box(input)).unwrap());
        });
    }
    group.finish();
}

fn bench_extend_one(c: &mut Criterion) {
    let mut builder = TreeBuilder::poseidon(TreeConfig::default()).unwrap();
    let base = builder.build(&leaves(1024)).unwrap();
    let next = vec![CommitmentLeaf::new(1024, FieldElement::from_u64(99), 1024)];
    c.bench_function("extend_one_leaf_after_1024", |b| {
        b.iter(|| builder.extend(black_box(&base), black_box(&next)).unwrap());
    });
}

criterion_group!(benches, bench_build, bench_extend_one);
criterion_main!(benches);
