use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tensor_summary::test_utils::SyntheticTensor;
use tensor_summary::{render, RenderOptions};

fn create_tensor(shape: &[i64]) -> SyntheticTensor {
    let size: i64 = shape.iter().product();
    let values: Vec<f32> = (0..size).map(|i| i as f32 * 0.5).collect();
    SyntheticTensor::float32(&values, shape)
}

fn bench_render(c: &mut Criterion) {
    let shapes: [(&[i64], &str); 4] = [
        (&[6], "vector_6"),
        (&[2048], "vector_2048"),
        (&[64, 64], "matrix_64"),
        (&[8, 8, 8, 8], "rank4_8"),
    ];

    let mut group = c.benchmark_group("render");
    let options = RenderOptions::default();
    for (shape, name) in shapes.iter() {
        let tensor = create_tensor(shape).build();
        group.bench_function(*name, |b| {
            b.iter(|| render(black_box(tensor.as_handle()), &(), black_box(&options)))
        });
    }

    let corrupt = create_tensor(&[64, 64]).size(-1).build();
    group.bench_function("placeholder", |b| {
        b.iter(|| render(black_box(corrupt.as_handle()), &(), black_box(&options)))
    });
    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
