use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gaze_engine::{FeatureVector, GazeModel, OnlineRegressor, Point2};

const DIM: usize = 66;

fn features(seed: usize) -> FeatureVector {
    FeatureVector::new(
        (0..DIM)
            .map(|j| (((seed * 31 + j * 17) % 97) as f64 / 97.0) + 0.01 * j as f64)
            .collect(),
    )
}

/// Cost of one `add` (full refit) as committed samples pile up over a session
fn benchmark_refit_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("refit_add");

    for committed_targets in [0usize, 5, 15, 25] {
        let mut model = OnlineRegressor::new(40);
        for t in 0..committed_targets {
            for k in 0..40 {
                let _ = model.add(&features(t * 40 + k), Point2::new(t as f64 * 40.0, k as f64));
            }
            model.commit();
        }

        let sample = features(7);
        group.bench_with_input(
            BenchmarkId::from_parameter(model.committed_len()),
            &sample,
            |b, sample| {
                b.iter(|| {
                    let _ = model.add(black_box(sample), black_box(Point2::new(960.0, 540.0)));
                })
            },
        );
    }

    group.finish();
}

fn benchmark_predict(c: &mut Criterion) {
    let mut model = OnlineRegressor::new(40);
    for k in 0..200 {
        let _ = model.add(&features(k), Point2::new(k as f64, 2.0 * k as f64));
    }
    let sample = features(3);

    c.bench_function("regressor_predict", |b| {
        b.iter(|| model.predict(black_box(&sample)))
    });
}

criterion_group!(benches, benchmark_refit_growth, benchmark_predict);
criterion_main!(benches);
