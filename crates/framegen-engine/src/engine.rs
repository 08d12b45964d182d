//! The FrameGen control surface.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use framegen_compute::{ComputeBackend, HostComputeBackend, shaders};
use framegen_core::{
    AtomicPerfStats, DisplaySink, EngineConfig, Frame, InterpolationMode, NeuralBackend,
    PerfStats, STATS_LEN, ThermalSensor,
};
use framegen_errors::{InitError, PipelineError};
use framegen_interp::{InterpolationEngine, StrategyKind};
use framegen_queue::FrameSlotQueue;
use framegen_timing::{AdaptiveState, AdaptiveTimingController};
use tracing::{debug, error, info};

use crate::capture::CaptureHandle;
use crate::config::ConfigCell;
use crate::interpolation::InterpolationWorker;
use crate::orchestrator::{PipelineOrchestrator, PipelineState};
use crate::presentation::PresentationWorker;

/// External collaborators of an engine.
pub struct EngineDeps {
    /// Compute backend shared by every stage
    pub compute: Arc<dyn ComputeBackend>,
    /// Where presented frames go
    pub sink: Box<dyn DisplaySink>,
    /// Optional neural inference backend
    pub neural: Option<Box<dyn NeuralBackend>>,
    /// Optional temperature source
    pub thermal: Option<Arc<dyn ThermalSensor>>,
}

impl EngineDeps {
    /// Dependencies with the given compute backend and sink.
    pub fn new(compute: Arc<dyn ComputeBackend>, sink: impl DisplaySink + 'static) -> Self {
        Self {
            compute,
            sink: Box::new(sink),
            neural: None,
            thermal: None,
        }
    }

    /// Dependencies on the host reference backend with built-in kernels.
    pub fn host(sink: impl DisplaySink + 'static) -> Self {
        Self::new(Arc::new(HostComputeBackend::with_builtin_kernels()), sink)
    }

    /// Add a neural backend.
    #[must_use]
    pub fn with_neural(mut self, backend: impl NeuralBackend + 'static) -> Self {
        self.neural = Some(Box::new(backend));
        self
    }

    /// Add a thermal sensor.
    #[must_use]
    pub fn with_thermal(mut self, sensor: Arc<dyn ThermalSensor>) -> Self {
        self.thermal = Some(sensor);
        self
    }
}

impl fmt::Debug for EngineDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineDeps")
            .field("compute", &self.compute.name())
            .field("neural", &self.neural.is_some())
            .field("thermal", &self.thermal.is_some())
            .finish_non_exhaustive()
    }
}

/// An initialized frame-generation pipeline and its control surface.
///
/// Setters only touch the shared configuration; the interpolation worker
/// picks changes up between pairs. Dropping the engine stops its workers.
#[derive(Debug)]
pub struct FrameGenEngine {
    config: Arc<ConfigCell>,
    stats: Arc<AtomicPerfStats>,
    controller: Arc<AdaptiveTimingController>,
    pipeline: PipelineOrchestrator,
    capture: Option<CaptureHandle>,
    strategy: StrategyKind,
}

impl FrameGenEngine {
    /// Initialize for a display of the given size and rate.
    ///
    /// The per-frame budget is one display interval, `1e9 / target_refresh_rate` ns.
    ///
    /// # Errors
    ///
    /// See [`FrameGenEngine::with_config`].
    pub fn initialize(
        width: u32,
        height: u32,
        mode: InterpolationMode,
        quality: f32,
        target_refresh_rate: u32,
        deps: EngineDeps,
    ) -> Result<Self, InitError> {
        let config = EngineConfig::for_display(width, height, mode, quality, target_refresh_rate);
        Self::with_config(config, deps)
    }

    /// Initialize from a full configuration.
    ///
    /// Shaders are loaded from `config.shader_dir` when set; every built-in
    /// pipeline must be available afterwards. No worker runs until
    /// [`FrameGenEngine::start`].
    ///
    /// # Errors
    ///
    /// - [`InitError::InvalidConfig`] if the configuration is invalid
    /// - [`InitError::ShaderIo`] or [`InitError::Compute`] if shader loading fails
    /// - [`InitError::MissingShader`] if a pipeline is still unavailable
    pub fn with_config(config: EngineConfig, deps: EngineDeps) -> Result<Self, InitError> {
        config.validate()?;
        prepare_shaders(deps.compute.as_ref(), config.shader_dir.as_deref())?;

        let (capture_tx, capture_rx) = FrameSlotQueue::new(config.capture_queue_depth)?;
        let (present_tx, present_rx) = FrameSlotQueue::new(config.present_queue_depth)?;
        let engine = InterpolationEngine::new(&config, deps.compute, deps.neural)?;
        let strategy = engine.strategy();
        let controller = Arc::new(AdaptiveTimingController::from_config(&config, deps.thermal));
        let stats = Arc::new(AtomicPerfStats::new());

        info!(
            width = config.width,
            height = config.height,
            mode = %config.mode,
            strategy = %strategy,
            budget_ns = config.max_frame_time_ns,
            refresh_rate = config.target_refresh_rate,
            "Frame generation engine initialized"
        );

        let config = Arc::new(ConfigCell::new(config));
        let interpolation = InterpolationWorker::new(
            capture_rx,
            present_tx,
            engine,
            Arc::clone(&controller),
            Arc::clone(&stats),
            Arc::clone(&config),
        );
        let presentation =
            PresentationWorker::new(present_rx, deps.sink, Arc::clone(&stats), Arc::clone(&config));

        Ok(Self {
            capture: Some(CaptureHandle::new(capture_tx, Arc::clone(&stats))),
            pipeline: PipelineOrchestrator::new(interpolation, presentation),
            config,
            stats,
            controller,
            strategy,
        })
    }

    /// Launch the workers.
    ///
    /// # Errors
    ///
    /// See [`PipelineOrchestrator::start`].
    pub fn start(&mut self) -> Result<(), PipelineError> {
        self.pipeline.start()
    }

    /// Stop and join the workers.
    ///
    /// # Errors
    ///
    /// See [`PipelineOrchestrator::stop`].
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        self.pipeline.stop()
    }

    /// Change the output multiplier.
    pub fn set_mode(&self, mode: InterpolationMode) {
        self.config.update(|c| c.mode = mode);
        debug!(mode = %mode, "Mode change requested");
    }

    /// Change the quality knob; the model scale follows its tier.
    pub fn set_quality(&self, quality: f32) {
        self.config.update(|c| c.set_quality(quality));
        debug!(quality, "Quality change requested");
    }

    /// Change the display rate; the per-frame budget becomes one interval.
    pub fn set_target_refresh_rate(&self, hz: u32) {
        self.config.update(|c| {
            c.target_refresh_rate = hz;
            c.max_frame_time_ns = 1_000_000_000 / u64::from(hz.max(1));
        });
        debug!(hz, "Refresh rate change requested");
    }

    /// Enable or disable thermal protection.
    pub fn set_thermal_protection(&self, enabled: bool) {
        self.config.update(|c| c.thermal_protection = enabled);
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> PerfStats {
        self.stats.snapshot()
    }

    /// Statistics in control-surface order: capture, motion, interp,
    /// present, total, fps, temp, generated, dropped.
    #[must_use]
    pub fn stats_array(&self) -> [f32; STATS_LEN] {
        self.stats.snapshot().to_array()
    }

    /// Zero every statistic.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Read the device temperature; `None` when unknown or protection is off.
    #[must_use]
    pub fn temperature(&self) -> Option<f32> {
        let reading = self.controller.sample_temperature();
        self.stats.set_temperature(reading);
        reading
    }

    /// Whether the last reading found the device throttled.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.controller.is_thermal_throttled()
    }

    /// Adaptive controller state.
    #[must_use]
    pub fn adaptive_state(&self) -> AdaptiveState {
        self.controller.state()
    }

    /// Queue a captured frame.
    ///
    /// Returns `false` if the frame was dropped or the capture handle has
    /// been taken.
    pub fn submit_frame(&mut self, frame: Frame) -> bool {
        match self.capture.as_mut() {
            Some(capture) => capture.submit(frame),
            None => {
                debug!(frame_index = frame.frame_index, "Capture handle taken, frame ignored");
                false
            }
        }
    }

    /// Move the capture handle out, for a capture thread.
    pub fn take_capture_handle(&mut self) -> Option<CaptureHandle> {
        self.capture.take()
    }

    /// Copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config.read()
    }

    /// Pipeline lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }

    /// The interpolation strategy selected at initialization.
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }
}

fn prepare_shaders(compute: &dyn ComputeBackend, dir: Option<&Path>) -> Result<(), InitError> {
    if let Some(dir) = dir {
        shaders::load_from_dir(compute, dir)?;
    }
    let missing = shaders::missing(compute, &shaders::BUILTIN_PIPELINES);
    if let Some(first) = missing.first() {
        error!(?missing, backend = compute.name(), "Required shaders are unavailable");
        return Err(InitError::MissingShader((*first).to_string()));
    }
    Ok(())
}
