//! Criterion benchmarks for the synthetic data path.
//!
//! Key metrics:
//! - Peak profile synthesis for the MarCCD and Xspress3 sample grids
//! - Radial projection for common detector image sizes
//! - Full MarCCD trigger (synthesis, projection, TIFF write, asset docs)
//!
//! Run with: cargo bench --bench synthesis

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ssrl_core::Triggerable;
use ssrl_driver_sim::peaks::{linspace, make_random_peaks, PeakParams};
use ssrl_driver_sim::producers::image_producer;
use ssrl_driver_sim::projection::generate_image;
use ssrl_driver_sim::{
    FilestoreLayout, ImageProducerConfig, SimRng, SynTiffDetector, TiffPersistence,
};
use std::sync::Arc;

fn peak_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("peak_synthesis");
    let rng = SimRng::seeded(1);

    let grids = vec![
        ("marccd_301", linspace(1.0, 6.0, 301), 0.05),
        ("xspress3_2000", linspace(1.0, 2000.0, 2000), 0.1),
    ];

    for (name, x, chance) in grids {
        let params = PeakParams::with_chance(chance);
        group.throughput(Throughput::Elements(x.len() as u64));
        group.bench_with_input(BenchmarkId::new("make_random_peaks", name), &x, |b, x| {
            b.iter(|| make_random_peaks(black_box(x), &params, &rng));
        });
    }

    group.finish();
}

fn radial_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("radial_projection");
    let x = linspace(1.0, 6.0, 301);
    let y = make_random_peaks(&x, &PeakParams::with_chance(0.05), &SimRng::seeded(2));

    for side in [128usize, 512, 1024] {
        group.throughput(Throughput::Elements((side * side) as u64));
        group.bench_with_input(BenchmarkId::new("generate_image", side), &side, |b, &side| {
            b.iter(|| generate_image(black_box(&x), black_box(&y), (side, side)).unwrap());
        });
    }

    group.finish();
}

fn marccd_trigger(c: &mut Criterion) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = ImageProducerConfig {
        shape: (256, 256),
        ..Default::default()
    };
    let mut det = SynTiffDetector::new(
        "MarCCD",
        TiffPersistence,
        image_producer(config, Arc::new(SimRng::seeded(3))),
    )
    .with_filestore(FilestoreLayout::new(temp_dir.path()));

    c.bench_function("marccd_trigger_256", |b| {
        b.iter(|| det.trigger().unwrap());
    });
}

criterion_group!(benches, peak_synthesis, radial_projection, marccd_trigger);
criterion_main!(benches);
