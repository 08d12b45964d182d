//! Run the pipeline on a synthetic scene

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use framegen_core::{EngineConfig, ThermalSensor};
use framegen_engine::{EngineDeps, FrameGenEngine, load_config};
use framegen_errors::ConfigError;
use framegen_timing::{StaticThermalSensor, SysfsThermalSensor};
use serde::Serialize;
use tracing::info;

use crate::commands::RunArgs;
use crate::error::CliError;
use crate::output;
use crate::source::{CountingSink, SyntheticSource};

/// Frame width used when neither a config file nor flags give one.
pub const DEMO_WIDTH: u32 = 160;
/// Frame height used when neither a config file nor flags give one.
pub const DEMO_HEIGHT: u32 = 90;

/// What a demo run did, as reported to the user.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub mode: String,
    pub strategy: String,
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
    pub seconds: f64,
    pub captured: u64,
    pub presented: u64,
    pub presented_synthetic: u64,
    pub quality: f32,
    pub model_scale: f32,
    pub throttled: bool,
    pub stats: framegen_core::PerfStats,
}

/// Execute a demo run
pub fn execute(args: &RunArgs, json: bool) -> Result<()> {
    let config = build_config(args)?;
    if args.source_fps == 0 {
        return Err(CliError::InvalidArgument("source fps must be positive".into()).into());
    }
    if !(args.duration.is_finite() && args.duration > 0.0) {
        return Err(CliError::InvalidArgument("duration must be positive".into()).into());
    }

    let thermal: Arc<dyn ThermalSensor> = match args.temperature {
        Some(celsius) => Arc::new(StaticThermalSensor::new(celsius)),
        None => Arc::new(SysfsThermalSensor::detect()),
    };
    let (sink, counters) = CountingSink::new();
    let deps = EngineDeps::host(sink).with_thermal(thermal);
    let mut engine = FrameGenEngine::with_config(config.clone(), deps).map_err(CliError::from)?;
    let mut capture = engine
        .take_capture_handle()
        .ok_or_else(|| anyhow!("capture handle already taken"))?;
    let mut source = SyntheticSource::new(config.width, config.height, args.speed);
    if let Some(frames) = args.frames {
        source = source.with_limit(frames);
    }

    engine.start().map_err(CliError::from)?;
    info!(
        mode = %config.mode,
        strategy = %engine.strategy(),
        source_fps = args.source_fps,
        "Demo run started"
    );

    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(args.source_fps));
    let run_for = Duration::from_secs_f64(args.duration);
    let started = Instant::now();
    let mut next_frame = started;
    let mut next_overlay = started + Duration::from_secs(1);
    let mut captured = 0u64;

    while started.elapsed() < run_for && !source.is_exhausted() {
        captured += capture.pump(&mut source, 1) as u64;
        next_frame += frame_interval;
        let now = Instant::now();
        if args.overlay && now >= next_overlay {
            println!("{}", engine.stats().overlay_text());
            next_overlay += Duration::from_secs(1);
        }
        thread::sleep(next_frame.saturating_duration_since(now));
    }
    let seconds = started.elapsed().as_secs_f64();
    engine.stop().map_err(CliError::from)?;

    let adaptive = engine.adaptive_state();
    let summary = RunSummary {
        mode: config.mode.to_string(),
        strategy: engine.strategy().to_string(),
        width: config.width,
        height: config.height,
        refresh_rate: config.target_refresh_rate,
        seconds,
        captured,
        presented: counters.presented(),
        presented_synthetic: counters.synthetic(),
        quality: adaptive.current_quality,
        model_scale: adaptive.current_scale,
        throttled: engine.is_throttled(),
        stats: engine.stats(),
    };
    output::print_run_summary(&summary, json)
}

/// Merge the config file, if any, with command-line overrides.
pub fn build_config(args: &RunArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .map_err(CliError::from)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig {
            width: DEMO_WIDTH,
            height: DEMO_HEIGHT,
            ..EngineConfig::default()
        },
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(quality) = args.quality {
        if !(0.0..=1.0).contains(&quality) {
            return Err(CliError::InvalidArgument(format!("quality {quality} is outside [0, 1]")).into());
        }
        config.set_quality(quality);
    }
    if let Some(rate) = args.rate {
        if rate == 0 {
            return Err(CliError::InvalidArgument("refresh rate must be positive".into()).into());
        }
        config.target_refresh_rate = rate;
        config.max_frame_time_ns = 1_000_000_000 / u64::from(rate);
    }
    if args.no_thermal {
        config.thermal_protection = false;
    }
    if let Some(dir) = &args.shader_dir {
        config.shader_dir = Some(dir.clone());
    }
    config
        .validate()
        .map_err(|e| CliError::Config(ConfigError::from(e)))?;
    Ok(config)
}
