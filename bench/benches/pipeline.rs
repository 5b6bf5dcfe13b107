use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use worldc::{
    fs::MemoryFileSystem,
    pipeline::{CompileRequest, Pipeline},
};

static INPUT: &str = include_str!("../../demos/world.wc");

fn criterion_benchmark(c: &mut Criterion) {
    let pipeline = Pipeline::with_file_system(MemoryFileSystem::new());

    for targets in [&["ts"][..], &["as"], &["ts", "as"]] {
        let request = CompileRequest {
            source: INPUT.to_owned(),
            filename: "world.wc".to_owned(),
            targets: targets.iter().map(|&t| t.to_owned()).collect(),
            ..CompileRequest::default()
        };
        c.bench_function(&format!("pipeline {}", targets.join("+")), |b| {
            b.iter(|| black_box(pipeline.compile(black_box(&request)).unwrap()));
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
