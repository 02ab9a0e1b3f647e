//! Pipeline benchmark: raw sample → merged feature vector.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dadm_pe_features::config::PipelineConfig;
use dadm_pe_features::{FeaturePipeline, ImportEntry, RawSample, ResourceEntry, Section};

const SYMBOLS: &[&str] = &[
    "VirtualAllocEx",
    "WriteProcessMemory",
    "CreateRemoteThread",
    "RegSetValueExW",
    "CreateFileW",
    "InternetOpenW",
    "GetTickCount",
    "LoadLibraryA",
];

fn make_dummy_sample(i: usize) -> RawSample {
    RawSample {
        id: Some(format!("bench_{}", i)),
        sections: (0..8)
            .map(|s| {
                Section::new(
                    format!(".s{}", s),
                    4096 * (s as i64 + 1),
                    4096 * (s as i64 + 1) + (i as i64 % 7) * 1000,
                    Some((s as f64 * 0.9 + i as f64 * 0.01) % 8.0),
                )
            })
            .collect(),
        imports: (0..120)
            .map(|k| ImportEntry::new(SYMBOLS[(k + i) % SYMBOLS.len()], format!("lib{}.dll", k % 9)))
            .collect(),
        exports: vec![],
        resources: (0..24)
            .map(|r| ResourceEntry::new(512 * (r as i64 + 1), ["RT_ICON", "RT_RCDATA", "RT_STRING"][r % 3]))
            .collect(),
    }
}

fn bench_derive(c: &mut Criterion) {
    let pipeline = FeaturePipeline::new(&PipelineConfig::default()).unwrap();
    let sample = make_dummy_sample(0);

    c.bench_function("derive_single_sample", |b| {
        b.iter(|| black_box(pipeline.derive(black_box(&sample))))
    });
    c.bench_function("derive_single_sample_sequential", |b| {
        b.iter(|| black_box(pipeline.derive_sequential(black_box(&sample))))
    });
}

fn bench_batch(c: &mut Criterion) {
    let pipeline = FeaturePipeline::new(&PipelineConfig::default()).unwrap();
    let samples: Vec<RawSample> = (0..256).map(make_dummy_sample).collect();

    c.bench_function("derive_batch_256", |b| {
        b.iter(|| black_box(pipeline.derive_batch(black_box(&samples))))
    });
}

criterion_group!(benches, bench_derive, bench_batch);
criterion_main!(benches);
