//! Integration tests for the interpolation engine.

use std::sync::Arc;
use std::time::Duration;

use framegen_compute::{HostComputeBackend, shaders};
use framegen_core::{EngineConfig, FrameImage, FrameOrigin, NeuralBackend};
use framegen_errors::{ComputeError, InterpolationError};
use framegen_interp::{InterpolationEngine, StrategyKind};
use framegen_test_helpers::fixtures::{mean_abs_diff, shifted_pair, textured_frame};
use framegen_test_helpers::mock::{FailingComputeBackend, ScriptedNeuralBackend};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const ONE_SECOND_NS: u64 = 1_000_000_000;

fn host() -> Arc<HostComputeBackend> {
    Arc::new(HostComputeBackend::with_builtin_kernels())
}

fn relaxed_config() -> EngineConfig {
    EngineConfig::default().with_budget_ns(ONE_SECOND_NS)
}

fn interior_diff(a: &FrameImage, b: &FrameImage, margin: u32) -> f32 {
    let (w, h) = a.dimensions();
    let mut total = 0.0f64;
    let mut n = 0usize;
    for y in margin..h - margin {
        for x in margin..w - margin {
            let pa = a.rgba_at(x, y);
            let pb = b.rgba_at(x, y);
            for c in 0..3 {
                total += f64::from((i16::from(pa[c]) - i16::from(pb[c])).unsigned_abs());
                n += 1;
            }
        }
    }
    (total / n.max(1) as f64) as f32
}

#[test]
fn fallback_reproduces_static_scene() -> TestResult {
    let mut engine = InterpolationEngine::new(&relaxed_config(), host(), None)?;
    assert_eq!(engine.strategy(), StrategyKind::Fallback);
    let a = textured_frame(48, 40, 0, 0, 0);
    let b = textured_frame(48, 40, 0, 0, 1);
    let mid = engine.interpolate(&a, &b, 0.5)?;
    assert!(mean_abs_diff(mid.image(), a.image()) < 1.0);
    assert!(mid.is_synthetic());
    Ok(())
}

#[test]
fn fallback_places_moving_content_at_the_timestep() -> TestResult {
    let mut engine = InterpolationEngine::new(&relaxed_config(), host(), None)?;
    engine.apply_adaptive(1.0, 1.0);
    let (a, b) = shifted_pair(64, 64, 4, 0);
    let mid = engine.interpolate(&a, &b, 0.5)?;
    let expected = textured_frame(64, 64, 2, 0, 0);
    let crossfade_error = interior_diff(a.image(), expected.image(), 12);
    let error = interior_diff(mid.image(), expected.image(), 12);
    assert!(
        error < crossfade_error * 0.5,
        "warped error {error} should beat the unwarped error {crossfade_error}"
    );
    assert!(engine.last_motion_elapsed() > Duration::ZERO);
    Ok(())
}

#[test]
fn synthetic_frames_come_in_timestep_order() -> TestResult {
    let mut engine = InterpolationEngine::new(&relaxed_config(), host(), None)?;
    let (a, b) = shifted_pair(32, 32, 2, 2);
    let frames = engine.interpolate_multi(&a, &b, 3)?;
    assert_eq!(frames.len(), 3);
    let steps: Vec<f32> = frames.iter().filter_map(|f| f.timestep()).collect();
    assert_eq!(steps.len(), 3);
    assert!(steps.windows(2).all(|w| w[0] < w[1]));
    assert!((steps[0] - 0.25).abs() < 1e-6);
    for frame in &frames {
        assert!(frame.timestamp_ns > a.timestamp_ns && frame.timestamp_ns < b.timestamp_ns);
        assert!(matches!(
            frame.origin,
            FrameOrigin::Synthetic { from_index: 0, to_index: 1, .. }
        ));
    }
    Ok(())
}

#[test]
fn over_budget_call_is_an_error() -> TestResult {
    let mut engine = InterpolationEngine::new(&EngineConfig::default().with_budget_ns(1), host(), None)?;
    let (a, b) = shifted_pair(32, 32, 1, 0);
    let err = engine.interpolate(&a, &b, 0.5);
    assert!(matches!(err, Err(InterpolationError::BudgetExceeded { budget_ns: 1, .. })));
    assert!(engine.interpolate_multi(&a, &b, 2).is_err());
    Ok(())
}

#[test]
fn invalid_timesteps_rejected() -> TestResult {
    let mut engine = InterpolationEngine::new(&relaxed_config(), host(), None)?;
    let (a, b) = shifted_pair(16, 16, 0, 0);
    for t in [0.0, 1.0, -0.5, 1.5, f32::NAN] {
        assert!(matches!(
            engine.interpolate(&a, &b, t),
            Err(InterpolationError::InvalidTimestep(_))
        ));
    }
    Ok(())
}

#[test]
fn mismatched_frames_rejected() -> TestResult {
    let mut engine = InterpolationEngine::new(&relaxed_config(), host(), None)?;
    let a = textured_frame(16, 16, 0, 0, 0);
    let b = textured_frame(24, 16, 0, 0, 1);
    assert!(matches!(
        engine.interpolate(&a, &b, 0.5),
        Err(InterpolationError::Validation(_))
    ));
    Ok(())
}

#[test]
fn rejected_warp_fails_interpolation() -> TestResult {
    let backend = Arc::new(FailingComputeBackend::rejecting(shaders::FRAME_WARP));
    let mut engine = InterpolationEngine::new(&relaxed_config(), backend, None)?;
    let (a, b) = shifted_pair(16, 16, 0, 0);
    assert!(matches!(
        engine.interpolate(&a, &b, 0.5),
        Err(InterpolationError::Compute(ComputeError::DispatchRejected { .. }))
    ));
    Ok(())
}

#[test]
fn neural_strategy_receives_each_timestep() -> TestResult {
    let (neural, recorder) = ScriptedNeuralBackend::new();
    let config = relaxed_config().with_model_path("models/rife.onnx");
    let neural: Box<dyn NeuralBackend> = Box::new(neural);
    let mut engine = InterpolationEngine::new(&config, host(), Some(neural))?;
    assert_eq!(engine.strategy(), StrategyKind::Neural);

    let a = textured_frame(40, 24, 0, 0, 0);
    let b = textured_frame(40, 24, 0, 0, 1);
    let frames = engine.interpolate_multi(&a, &b, 3)?;
    assert_eq!(frames.len(), 3);
    assert_eq!(recorder.calls(), 3);
    let seen = recorder.timesteps();
    let expected = [0.25f32, 0.5, 0.75];
    assert_eq!(seen.len(), expected.len());
    for (got, want) in seen.iter().zip(expected) {
        assert!((got - want).abs() < 1e-6);
    }
    assert_eq!(frames[0].dimensions(), (40, 24));
    Ok(())
}

#[test]
fn model_load_failure_falls_back_permanently() -> TestResult {
    let (neural, recorder) = ScriptedNeuralBackend::new();
    let neural: Box<dyn NeuralBackend> = Box::new(neural.failing_load());
    let config = relaxed_config().with_model_path("missing.onnx");
    let mut engine = InterpolationEngine::new(&config, host(), Some(neural))?;
    assert_eq!(engine.strategy(), StrategyKind::Fallback);
    let (a, b) = shifted_pair(16, 16, 0, 0);
    assert!(engine.interpolate(&a, &b, 0.5).is_ok());
    assert_eq!(recorder.calls(), 0);
    Ok(())
}

#[test]
fn slow_second_frame_truncates_batch() -> TestResult {
    let (neural, recorder) = ScriptedNeuralBackend::new();
    let neural: Box<dyn NeuralBackend> =
        Box::new(neural.with_delays(vec![Duration::ZERO, Duration::from_millis(60)]));
    let config = EngineConfig::default()
        .with_budget_ns(20_000_000)
        .with_model_path("models/rife.onnx");
    let mut engine = InterpolationEngine::new(&config, host(), Some(neural))?;
    let (a, b) = shifted_pair(16, 16, 0, 0);
    let frames = engine.interpolate_multi(&a, &b, 3)?;
    assert_eq!(frames.len(), 1);
    assert_eq!(recorder.calls(), 2, "a truncated batch is never retried");
    Ok(())
}

#[test]
fn quality_setter_remaps_scale_by_tier() -> TestResult {
    let mut engine = InterpolationEngine::new(&relaxed_config(), host(), None)?;
    for (quality, scale) in [(0.1, 0.25), (0.3, 0.5), (0.59, 0.5), (0.6, 0.75), (1.0, 0.75)] {
        engine.set_quality(quality);
        assert!((engine.model_scale() - scale).abs() < 1e-6, "quality {quality}");
    }
    engine.set_model_scale(4.0);
    assert!((engine.model_scale() - 1.0).abs() < 1e-6);
    engine.set_model_scale(0.0);
    assert!((engine.model_scale() - 0.25).abs() < 1e-6);
    Ok(())
}
