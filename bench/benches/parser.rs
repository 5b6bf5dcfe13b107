use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use worldc::{
    lexer::{self, LexerOptions},
    parser,
    util::intern::Interner,
};

static INPUT: &str = include_str!("../../demos/world.wc");

fn criterion_benchmark(c: &mut Criterion) {
    let input = INPUT.repeat(32);
    let tokens = lexer::tokenize(&input, &LexerOptions::default()).unwrap();

    c.bench_function("parser", |b| {
        b.iter(|| {
            let mut interner = Interner::with_capacity(256);
            let program = parser::parse(black_box(&input), &tokens, &mut interner).unwrap();
            black_box(program);
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
