use criterion::{black_box, criterion_group, criterion_main, Criterion};
use csvload::parsers::Tokenizer;

fn make_row(columns: usize) -> String {
    (0..columns)
        .map(|i| match i % 4 {
            0 => format!("{}", i * 37),
            1 => format!("{}.25", i),
            2 => "2020-01-01".to_string(),
            _ => format!("\"word, {}\"", i),
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let tokenizer = Tokenizer::new('\\', ',', '"');

    c.bench_function("tokenizing thin row (4 columns)", |b| {
        let line = make_row(4);
        b.iter(|| tokenizer.tokenize(black_box(&line)))
    });

    c.bench_function("tokenizing medium row (8 columns)", |b| {
        let line = make_row(8);
        b.iter(|| tokenizer.tokenize(black_box(&line)))
    });

    c.bench_function("tokenizing wide row (32 columns)", |b| {
        let line = make_row(32);
        b.iter(|| tokenizer.tokenize(black_box(&line)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
