use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use health_analyzer::{
    HealthAnalyzer,
    aggregate::{AggregateVerb, GroupKey},
    clean,
    sample::generate_sample,
    timeseries::Frequency,
};

fn bench_clean_and_aggregate(c: &mut Criterion) {
    let raw = generate_sample(10_000, 42).expect("sample rows");
    let analyzer = HealthAnalyzer::new(&raw);

    let mut group = c.benchmark_group("patient_records");
    group.bench_function("clean", |b| {
        b.iter_batched(|| raw.clone(), |raw| clean(&raw), BatchSize::LargeInput)
    });
    group.bench_function("outcomes_by_age_bucket", |b| {
        b.iter(|| {
            analyzer
                .summarize_outcomes_by(GroupKey::AgeBucket { width: 10.0 })
                .expect("crosstab")
        })
    });
    group.bench_function("median_stay_by_department", |b| {
        b.iter(|| {
            analyzer
                .aggregate_by(
                    GroupKey::Department,
                    AggregateVerb::Median,
                    Some(black_box("length_of_stay")),
                )
                .expect("aggregate")
        })
    });
    group.bench_function("weekly_admissions", |b| {
        b.iter(|| analyzer.admissions_over_time(Frequency::Week).expect("series"))
    });
    group.finish();
}

criterion_group!(benches, bench_clean_and_aggregate);
criterion_main!(benches);
