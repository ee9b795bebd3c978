use criterion::{black_box, criterion_group, criterion_main, Criterion};
use csvload::schema::ColumnInfo;

pub fn criterion_benchmark(c: &mut Criterion) {
    let tokens = ["1200", "-48.05", "2019-02-28 23:59:59.999", "true", "word"];
    for token in &tokens {
        c.bench_function(&format!("analyzing {:?}", token), |b| {
            b.iter(|| {
                let mut column = ColumnInfo::new("c");
                column.analyze_token(black_box(token));
                column
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
