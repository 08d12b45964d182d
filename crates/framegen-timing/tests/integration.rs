//! Behavioural tests for the adaptive timing controller and sensors.

use std::fs;
use std::sync::Arc;

use framegen_core::{EngineConfig, ThermalSensor};
use framegen_timing::controller::{OVER_STREAK, THROTTLED_OVER_STREAK, UNDER_STREAK};
use framegen_timing::{
    AdaptiveTimingController, Adjustment, StaticThermalSensor, SysfsThermalSensor,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const TARGET_MS: f32 = 8.0;

fn unprotected(quality: f32, scale: f32) -> AdaptiveTimingController {
    AdaptiveTimingController::new(TARGET_MS, quality, scale, false, None)
}

fn protected(sensor: Arc<StaticThermalSensor>) -> AdaptiveTimingController {
    let sensor: Arc<dyn ThermalSensor> = sensor;
    AdaptiveTimingController::new(TARGET_MS, 0.5, 0.5, true, Some(sensor))
}

#[test]
fn five_over_budget_frames_reduce_exactly_once() {
    let controller = unprotected(0.5, 0.5);
    let mut reductions = 0;
    for i in 0..OVER_STREAK {
        let verdict = controller.on_frame_complete(12.0);
        assert!(!verdict.within_budget, "frame {i} is over budget");
        if verdict.adjustment == Adjustment::Reduced {
            reductions += 1;
        }
    }
    assert_eq!(reductions, 1);
    let state = controller.state();
    assert!((state.current_scale - 0.4).abs() < 1e-6);
    assert!((state.current_quality - 0.35).abs() < 1e-6);
    assert_eq!(state.consecutive_over, 0);
}

#[test]
fn four_over_budget_frames_do_not_reduce() {
    let controller = unprotected(0.5, 0.5);
    for _ in 0..OVER_STREAK - 1 {
        assert_eq!(controller.on_frame_complete(12.0).adjustment, Adjustment::None);
    }
    assert!((controller.state().current_scale - 0.5).abs() < 1e-6);
}

#[test]
fn reductions_floor_at_minimum_scale() {
    let controller = unprotected(0.2, 0.3);
    for _ in 0..OVER_STREAK * 4 {
        controller.on_frame_complete(30.0);
    }
    let state = controller.state();
    assert!((state.current_scale - 0.25).abs() < 1e-6);
    assert!(state.current_quality.abs() < 1e-6);
}

#[test]
fn thirty_fast_frames_increase_exactly_once() {
    let controller = unprotected(0.5, 0.5);
    let mut increases = 0;
    for _ in 0..UNDER_STREAK {
        let verdict = controller.on_frame_complete(2.0);
        assert!(verdict.within_budget);
        if verdict.adjustment == Adjustment::Increased {
            increases += 1;
        }
    }
    assert_eq!(increases, 1);
    let state = controller.state();
    assert!((state.current_scale - 0.55).abs() < 1e-6);
    assert!((state.current_quality - 0.55).abs() < 1e-6);
}

#[test]
fn increases_cap_scale() {
    let controller = unprotected(0.9, 0.72);
    for _ in 0..UNDER_STREAK * 3 {
        controller.on_frame_complete(1.0);
    }
    let state = controller.state();
    assert!((state.current_scale - 0.75).abs() < 1e-6);
    assert!((state.current_quality - 1.0).abs() < 1e-6);
}

#[test]
fn increase_from_full_scale_lands_on_ceiling() {
    let controller = AdaptiveTimingController::new(10.0, 0.5, 1.0, false, None);
    for _ in 0..UNDER_STREAK {
        controller.on_frame_complete(1.0);
    }
    let state = controller.state();
    assert!(state.current_scale <= 0.75);
    assert!((state.current_quality - 0.55).abs() < 1e-6);
}

#[test]
fn no_increase_without_headroom() {
    let controller = unprotected(0.5, 0.5);
    for _ in 0..UNDER_STREAK {
        assert_eq!(controller.on_frame_complete(7.5).adjustment, Adjustment::None);
    }
}

#[test]
fn thermal_critical_forces_minimum_whatever_the_latency() {
    let sensor = Arc::new(StaticThermalSensor::new(90.0));
    let controller = protected(Arc::clone(&sensor));
    let verdict = controller.on_frame_complete(0.5);
    assert!(!verdict.within_budget);
    assert_eq!(verdict.adjustment, Adjustment::ThermalCritical);
    assert!((verdict.scale - 0.25).abs() < 1e-6);
    assert!(verdict.quality.abs() < 1e-6);
    assert!(controller.is_thermal_throttled());
    assert_eq!(controller.temperature(), Some(90.0));
    assert_eq!(controller.state().consecutive_under, 1);
}

#[test]
fn throttled_device_reduces_after_three() {
    let sensor = Arc::new(StaticThermalSensor::new(80.0));
    let controller = protected(sensor);
    let verdicts: Vec<_> = (0..THROTTLED_OVER_STREAK)
        .map(|_| controller.on_frame_complete(10.0))
        .collect();
    assert_eq!(verdicts.last().map(|v| v.adjustment), Some(Adjustment::Reduced));
    assert!(controller.is_thermal_throttled());
}

#[test]
fn protection_off_ignores_heat() {
    let sensor: Arc<dyn ThermalSensor> = Arc::new(StaticThermalSensor::new(99.0));
    let controller = AdaptiveTimingController::new(TARGET_MS, 0.5, 0.5, false, Some(sensor));
    let verdict = controller.on_frame_complete(1.0);
    assert!(verdict.within_budget);
    assert_eq!(verdict.adjustment, Adjustment::None);
    assert!(!controller.is_thermal_throttled());
    assert_eq!(controller.temperature(), None);
}

#[test]
fn unknown_temperature_is_not_throttled() {
    let sensor = Arc::new(StaticThermalSensor::unknown());
    let controller = protected(sensor);
    for _ in 0..THROTTLED_OVER_STREAK {
        assert_eq!(controller.on_frame_complete(10.0).adjustment, Adjustment::None);
    }
    assert!(!controller.is_thermal_throttled());
}

#[test]
fn from_config_derives_target() {
    let config = EngineConfig::default().with_budget_ns(16_000_000);
    let controller = AdaptiveTimingController::from_config(&config, None);
    assert!((controller.state().target_ms - 16.0).abs() < 1e-6);
    controller.set_budget_ns(4_000_000);
    assert!((controller.state().target_ms - 4.0).abs() < 1e-6);
}

#[test]
fn sysfs_detect_prefers_fixed_zones() -> TestResult {
    let root = tempfile::tempdir()?;
    let zone1 = root.path().join("sys/class/thermal/thermal_zone1");
    fs::create_dir_all(&zone1)?;
    fs::write(zone1.join("temp"), "51000\n")?;
    let sensor = SysfsThermalSensor::detect_under(root.path());
    assert_eq!(sensor.path(), Some(zone1.join("temp").as_path()));
    assert_eq!(sensor.read_celsius(), Some(51.0));
    Ok(())
}

#[test]
fn sysfs_detect_finds_gpu_zone_by_type() -> TestResult {
    let root = tempfile::tempdir()?;
    let zone = root.path().join("sys/class/thermal/thermal_zone7");
    fs::create_dir_all(&zone)?;
    fs::write(zone.join("type"), "GPU-therm\n")?;
    fs::write(zone.join("temp"), "66")?;
    let cpu = root.path().join("sys/class/thermal/thermal_zone5");
    fs::create_dir_all(&cpu)?;
    fs::write(cpu.join("type"), "x86_pkg_temp\n")?;
    fs::write(cpu.join("temp"), "40000")?;
    let sensor = SysfsThermalSensor::detect_under(root.path());
    assert_eq!(sensor.read_celsius(), Some(66.0));
    Ok(())
}

#[test]
fn sysfs_detect_without_zones_has_no_reading() -> TestResult {
    let root = tempfile::tempdir()?;
    let sensor = SysfsThermalSensor::detect_under(root.path());
    assert!(sensor.path().is_none());
    assert_eq!(sensor.read_celsius(), None);
    Ok(())
}
