use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use worldc::lexer::{self, LexerOptions};

static INPUT: &str = include_str!("../../demos/world.wc");

fn lexer(input: &str, options: &LexerOptions) {
    let tokens = lexer::tokenize(input, options).unwrap();
    black_box(tokens.len());
}

fn criterion_benchmark(c: &mut Criterion) {
    let input = INPUT.repeat(32);
    c.bench_function("lexer", |b| {
        b.iter(|| lexer(black_box(&input), &LexerOptions::default()));
    });
    c.bench_function("lexer lossless", |b| {
        b.iter(|| lexer(black_box(&input), &LexerOptions::LOSSLESS));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
