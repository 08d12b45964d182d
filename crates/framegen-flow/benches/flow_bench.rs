//! Benchmarks for motion estimation on the host reference backend.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use framegen_compute::HostComputeBackend;
use framegen_core::MotionParams;
use framegen_flow::{MotionEstimator, OpticalFlowEngine};
use framegen_test_helpers::fixtures::shifted_pair;

fn bench_estimate(c: &mut Criterion) {
    let backend = Arc::new(HostComputeBackend::with_builtin_kernels());
    let Ok(estimator) = MotionEstimator::new(backend, MotionParams::default()) else {
        return;
    };
    let (a, b) = shifted_pair(160, 90, 3, -2);
    c.bench_function("motion_estimate_160x90", |bench| {
        bench.iter(|| black_box(estimator.estimate(&a, &b).is_ok()));
    });
}

fn bench_bidirectional(c: &mut Criterion) {
    let backend = Arc::new(HostComputeBackend::with_builtin_kernels());
    let Ok(engine) = OpticalFlowEngine::new(backend, MotionParams::default()) else {
        return;
    };
    let (a, b) = shifted_pair(160, 90, 3, -2);
    c.bench_function("optical_flow_bidirectional_160x90", |bench| {
        bench.iter(|| black_box(engine.compute_bidirectional(&a, &b).is_ok()));
    });
}

criterion_group!(benches, bench_estimate, bench_bidirectional);
criterion_main!(benches);
