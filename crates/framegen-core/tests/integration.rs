//! Integration tests for configuration serialization and frame metadata.

use framegen_core::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn config_round_trips_through_yaml() -> TestResult {
    let config = EngineConfig::for_display(1920, 1080, InterpolationMode::Triple, 0.7, 90)
        .with_model_path("models/rife-v4.6-lite")
        .with_thermal_protection(false);
    let yaml = serde_yaml::to_string(&config)?;
    assert!(yaml.contains("3x"));
    let parsed: EngineConfig = serde_yaml::from_str(&yaml)?;
    assert_eq!(parsed, config);
    Ok(())
}

#[test]
fn partial_json_fills_defaults() -> TestResult {
    let parsed: EngineConfig = serde_json::from_str(r#"{ "mode": "off", "quality": 0.9 }"#)?;
    assert_eq!(parsed.mode, InterpolationMode::Off);
    assert!((parsed.quality - 0.9).abs() < f32::EPSILON);
    assert_eq!(parsed.capture_queue_depth, 8);
    assert_eq!(parsed.present_queue_depth, 16);
    assert_eq!(parsed.motion, MotionParams::default());
    Ok(())
}

#[test]
fn unknown_mode_is_rejected() {
    let parsed = serde_json::from_str::<EngineConfig>(r#"{ "mode": "8x" }"#);
    assert!(parsed.is_err());
}

#[test]
fn synthetic_frames_keep_endpoint_indexes() -> TestResult {
    let a = Frame::captured(FrameImage::new(8, 8, PixelFormat::Rgba8)?, 10, 0);
    let b = Frame::captured(FrameImage::new(8, 8, PixelFormat::Rgba8)?, 11, 33_000_000);
    let mid = Frame::synthetic(FrameImage::new(8, 8, PixelFormat::Rgba8)?, &a, &b, 0.5, GpuFence::signaled());
    assert_eq!(mid.timestamp_ns, 16_500_000);
    assert_eq!(mid.timestep(), Some(0.5));
    assert!(mid.ready.is_signaled());
    assert!(a.timestep().is_none());
    Ok(())
}

#[test]
fn stats_snapshot_flattens_in_surface_order() {
    let stats = AtomicPerfStats::new();
    stats.set_effective_fps(60.0);
    stats.set_temperature(Some(70.0));
    stats.add_generated(5);
    stats.add_dropped(2);
    let array = stats.snapshot().to_array();
    assert!((array[5] - 60.0).abs() < f32::EPSILON);
    assert!((array[6] - 70.0).abs() < f32::EPSILON);
    assert!((array[7] - 5.0).abs() < f32::EPSILON);
    assert!((array[8] - 2.0).abs() < f32::EPSILON);
}
