//! Ordering properties of the interpolation worker.

use std::sync::Arc;

use framegen_compute::HostComputeBackend;
use framegen_core::{AtomicPerfStats, EngineConfig, Frame, InterpolationMode};
use framegen_engine::{ConfigCell, InterpolationWorker};
use framegen_interp::InterpolationEngine;
use framegen_queue::{FrameConsumer, FrameSlotQueue};
use framegen_test_helpers::fixtures::gradient_frame;
use framegen_test_helpers::mock::ScriptedNeuralBackend;
use framegen_timing::AdaptiveTimingController;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

const MODES: [InterpolationMode; 4] = [
    InterpolationMode::Off,
    InterpolationMode::Double,
    InterpolationMode::Triple,
    InterpolationMode::Quadruple,
];

fn worker(mode: InterpolationMode) -> Option<(InterpolationWorker, FrameConsumer, Arc<ConfigCell>)> {
    let config = EngineConfig {
        width: 8,
        height: 8,
        present_queue_depth: 256,
        thermal_protection: false,
        ..EngineConfig::default()
    }
    .with_mode(mode)
    .with_budget_ns(u64::MAX)
    .with_model_path("scripted.model");
    let (neural, _recorder) = ScriptedNeuralBackend::new();
    let engine = InterpolationEngine::new(
        &config,
        Arc::new(HostComputeBackend::with_builtin_kernels()),
        Some(Box::new(neural)),
    )
    .ok()?;
    let controller = Arc::new(AdaptiveTimingController::from_config(&config, None));
    let cell = Arc::new(ConfigCell::new(config));
    let (_capture_tx, capture_rx) = FrameSlotQueue::new(2).ok()?;
    let (present_tx, present_rx) = FrameSlotQueue::new(256).ok()?;
    let worker = InterpolationWorker::new(
        capture_rx,
        present_tx,
        engine,
        controller,
        Arc::new(AtomicPerfStats::new()),
        Arc::clone(&cell),
    );
    Some((worker, present_rx, cell))
}

/// Every captured frame appears exactly once, in order, and each synthetic
/// frame sits between its endpoints with ascending timesteps.
fn well_ordered(frames: &[Frame], captured: u64) -> bool {
    let indices: Vec<u64> = frames
        .iter()
        .filter(|f| !f.is_synthetic())
        .map(|f| f.frame_index)
        .collect();
    if indices != (0..captured).collect::<Vec<_>>() {
        return false;
    }
    let mut last_captured = None;
    let mut last_timestep = 0.0f32;
    for frame in frames {
        match frame.timestep() {
            None => {
                last_captured = Some(frame.frame_index);
                last_timestep = 0.0;
            }
            Some(t) => {
                if Some(frame.frame_index) != last_captured || t <= last_timestep {
                    return false;
                }
                last_timestep = t;
            }
        }
    }
    true
}

#[quickcheck]
fn prop_capture_order_survives_mode_changes(mode_codes: Vec<u8>) -> TestResult {
    if mode_codes.is_empty() {
        return TestResult::discard();
    }
    let mode_codes = &mode_codes[..mode_codes.len().min(24)];
    let Some((mut worker, mut presented, config)) = worker(InterpolationMode::Double) else {
        return TestResult::error("worker setup failed");
    };
    for (i, code) in mode_codes.iter().enumerate() {
        let mode = MODES[usize::from(*code) % MODES.len()];
        config.update(|c| c.mode = mode);
        worker.process_frame(gradient_frame(8, 8, i as u64));
    }
    worker.flush();
    let frames: Vec<Frame> = std::iter::from_fn(|| presented.pop()).collect();
    TestResult::from_bool(well_ordered(&frames, mode_codes.len() as u64))
}

#[quickcheck]
fn prop_generated_matches_mode(count: u8) -> TestResult {
    let count = u64::from(count % 12) + 2;
    for mode in MODES {
        let Some((mut worker, mut presented, _config)) = worker(mode) else {
            return TestResult::error("worker setup failed");
        };
        let generated: usize = (0..count)
            .map(|i| worker.process_frame(gradient_frame(8, 8, i)).generated)
            .sum();
        worker.flush();
        let expected = (count as usize - 1) * mode.intermediate_count();
        let total = std::iter::from_fn(|| presented.pop()).count();
        if generated != expected || total != expected + count as usize {
            return TestResult::failed();
        }
    }
    TestResult::passed()
}

#[quickcheck]
fn prop_revision_counts_updates(updates: u8) -> bool {
    let cell = ConfigCell::new(EngineConfig::default());
    for _ in 0..updates {
        cell.update(|c| c.quality = 0.3);
    }
    cell.revision() == u64::from(updates) && cell.newer_than(u64::from(updates)).is_none()
}
