use criterion::Criterion;

use gcsignal::simulate::{ChromatogramSimulator, SimulatedCompound};
use gcsignal::{BaselineMethod, ChromatogramArrays, PeakDetector};

fn noisy_chromatogram(seed: u64) -> ChromatogramArrays<'static> {
    let compounds: Vec<_> = (1..10)
        .map(|i| SimulatedCompound::new(format!("c{i}"), i as f64, 500.0 + 50.0 * i as f64, 0.08))
        .collect();
    ChromatogramSimulator::default()
        .with_noise_level(2.0)
        .with_seed(seed)
        .simulate(&compounds, true, true)
        .unwrap()
}

fn baseline_methods(c: &mut Criterion) {
    let arrays = noisy_chromatogram(1);
    for method in [
        BaselineMethod::None,
        BaselineMethod::RollingMin,
        BaselineMethod::Polynomial,
    ] {
        let detector = PeakDetector::new(5.0, 0.05, 50, method);
        c.bench_function(&format!("detect_{method}"), |b| {
            b.iter(|| detector.detect_arrays(&arrays).unwrap())
        });
    }
}

fn batch_detection(c: &mut Criterion) {
    let signals: Vec<_> = (0..32).map(noisy_chromatogram).collect();
    let detector = PeakDetector::default();
    c.bench_function("detect_batch_32", |b| {
        b.iter(|| detector.detect_batch(&signals))
    });
}

criterion::criterion_group!(benches, baseline_methods, batch_detection);
criterion::criterion_main!(benches);
