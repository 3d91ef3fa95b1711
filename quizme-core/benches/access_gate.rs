use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quizme_core::gate::evaluate;
use quizme_core::{AccessGate, MemoryStore, Question, Quiz};
use std::sync::Arc;

fn domains(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("partner{}.example.com", i)).collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for size in [1, 10, 100] {
        let list = domains(size);
        let hit = format!("https://{}", list[size - 1]);
        group.bench_with_input(BenchmarkId::new("last_match", size), &list, |b, list| {
            b.iter(|| evaluate(black_box(list), black_box(&hit)))
        });
        group.bench_with_input(BenchmarkId::new("no_match", size), &list, |b, list| {
            b.iter(|| evaluate(black_box(list), black_box("https://unknown.org")))
        });
    }

    group.finish();
}

fn bench_authorize(c: &mut Criterion) {
    let store = MemoryStore::new();
    store.insert(
        Quiz::new(
            "bench",
            "Bench",
            vec![Question::new("Q?", vec!["a".into(), "b".into()], "a")],
        )
        .with_allowed_domains(domains(10)),
    );
    let gate = AccessGate::new(Arc::new(store));

    c.bench_function("authorize_restricted", |b| {
        b.iter(|| gate.authorize(black_box("bench"), Some(black_box("https://partner5.example.com"))))
    });
}

criterion_group!(benches, bench_evaluate, bench_authorize);
criterion_main!(benches);
