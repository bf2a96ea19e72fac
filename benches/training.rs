use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use scorecast::optimizer::SamplerKind;
use scorecast::prelude::*;
use scorecast::training::fit_with_early_stopping;

fn synthetic(n_rows: usize, n_features: usize) -> (NumericTable, NumericTable) {
    let features = NumericTable {
        names: (0..n_features).map(|c| format!("f{}", c)).collect(),
        values: Array2::from_shape_fn((n_rows, n_features), |(r, c)| {
            (((r * 31 + c * 17 + 7) % 97) as f64) / 97.0 * 10.0 - 5.0
        }),
    };
    let targets = NumericTable {
        names: vec!["home".to_string(), "away".to_string()],
        values: Array2::from_shape_fn((n_rows, 2), |(r, t)| {
            let row = features.values.row(r);
            if t == 0 {
                2.0 * row[0] - 1.5 * row[1]
            } else {
                row[2] + 0.5 * row[0]
            }
        }),
    };
    (features, targets)
}

fn bench_boosted_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("boosted_fit");
    group.sample_size(10);

    for n_rows in [200, 1000] {
        let (features, targets) = synthetic(n_rows, 8);
        let split = split_dataset(&features, &targets, 0.2, 42).unwrap();

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &split, |b, split| {
            b.iter(|| {
                let params = TrialParams::new();
                let mut session = ModelKind::GradientBoosting
                    .start_session(&params, black_box(split), 42)
                    .unwrap();
                fit_with_early_stopping(session.as_mut(), 30, 10).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let (features, targets) = synthetic(200, 8);
    let mut columns: Vec<polars::prelude::Column> = features
        .names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            polars::prelude::Column::new(
                name.as_str().into(),
                features.values.column(i).to_vec(),
            )
        })
        .collect();
    for (i, name) in targets.names.iter().enumerate() {
        columns.push(polars::prelude::Column::new(
            name.as_str().into(),
            targets.values.column(i).to_vec(),
        ));
    }
    let df = polars::prelude::DataFrame::new(columns).unwrap();

    let config = PipelineConfig {
        target_columns: targets.names.clone(),
        max_rounds: 20,
        patience: 5,
        search: SearchConfig::default()
            .with_n_trials(3)
            .with_sampler(SamplerKind::Random),
        ..Default::default()
    };

    group.bench_function("run_training", |b| {
        b.iter(|| run_training(black_box(&df), black_box(&config)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_boosted_fit, bench_pipeline);
criterion_main!(benches);
