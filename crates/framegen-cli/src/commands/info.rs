//! Backend, shader and thermal information

use anyhow::Result;
use framegen_compute::{ComputeBackend, HostComputeBackend, shaders};
use framegen_core::{EngineConfig, ThermalSensor};
use framegen_timing::SysfsThermalSensor;

/// Execute the info command
pub fn execute(json: bool) -> Result<()> {
    let backend = HostComputeBackend::with_builtin_kernels();
    let sensor = SysfsThermalSensor::detect();
    let defaults = EngineConfig::default();

    if json {
        let output = serde_json::json!({
            "success": true,
            "version": env!("CARGO_PKG_VERSION"),
            "backend": backend.name(),
            "pipelines": shaders::BUILTIN_PIPELINES,
            "thermal_zone": sensor.path().map(|p| p.display().to_string()),
            "temperature_c": sensor.read_celsius(),
            "defaults": defaults,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("framegen {}", env!("CARGO_PKG_VERSION"));
    println!("Compute backend: {}", backend.name());
    println!("Pipelines:");
    for name in shaders::BUILTIN_PIPELINES {
        let state = if backend.is_loaded(name) { "loaded" } else { "missing" };
        println!("  {name:<18} {state}");
    }
    match sensor.path() {
        Some(path) => match sensor.read_celsius() {
            Some(celsius) => println!("Thermal zone: {} ({celsius:.1} °C)", path.display()),
            None => println!("Thermal zone: {} (no reading)", path.display()),
        },
        None => println!("Thermal zone: none found"),
    }
    println!(
        "Defaults: {}x{} {} at {} Hz, budget {:.2} ms, quality {:.2}",
        defaults.width,
        defaults.height,
        defaults.mode,
        defaults.target_refresh_rate,
        defaults.max_frame_time_ns as f64 / 1e6,
        defaults.quality
    );
    Ok(())
}
