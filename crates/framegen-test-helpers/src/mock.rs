//! Mock collaborators for pipeline tests.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use framegen_compute::{ComputeBackend, ComputePass, HostComputeBackend};
use framegen_core::ports::tensor_names;
use framegen_core::{DisplaySink, Frame, GpuFence, NamedTensor, NeuralBackend};
use framegen_errors::{ComputeError, ComputeResult, InferenceError, PresentError};
use ndarray::{ArrayD, IxDyn};
use parking_lot::Mutex;

/// What a [`RecordingSink`] saw for one presented frame.
#[derive(Debug, Clone)]
pub struct PresentedFrame {
    /// The frame handle
    pub frame: Frame,
    /// Deadline the presenter scheduled it for
    pub deadline: Instant,
}

/// Shared view of the frames a [`RecordingSink`] received.
#[derive(Debug, Clone, Default)]
pub struct PresentLog {
    inner: Arc<Mutex<Vec<PresentedFrame>>>,
}

impl PresentLog {
    /// Number of presented frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing was presented.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of everything presented so far.
    #[must_use]
    pub fn frames(&self) -> Vec<PresentedFrame> {
        self.inner.lock().clone()
    }
}

/// Display sink that records every frame.
#[derive(Debug, Default)]
pub struct RecordingSink {
    log: PresentLog,
}

impl RecordingSink {
    /// Create a sink and the log handle that observes it.
    #[must_use]
    pub fn new() -> (Self, PresentLog) {
        let log = PresentLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl DisplaySink for RecordingSink {
    fn present(&mut self, frame: &Frame, deadline: Instant) -> Result<(), PresentError> {
        self.log.inner.lock().push(PresentedFrame {
            frame: frame.clone(),
            deadline,
        });
        Ok(())
    }
}

/// Display sink that rejects every frame.
#[derive(Debug, Default)]
pub struct FailingSink {
    attempts: Arc<AtomicU64>,
}

impl FailingSink {
    /// Create a failing sink and a counter of attempted presents.
    #[must_use]
    pub fn new() -> (Self, Arc<AtomicU64>) {
        let attempts = Arc::new(AtomicU64::new(0));
        (
            Self {
                attempts: Arc::clone(&attempts),
            },
            attempts,
        )
    }
}

impl DisplaySink for FailingSink {
    fn present(&mut self, _frame: &Frame, _deadline: Instant) -> Result<(), PresentError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(PresentError::SurfaceLost)
    }
}

/// Compute backend that rejects dispatches of one pipeline.
#[derive(Debug)]
pub struct FailingComputeBackend {
    inner: HostComputeBackend,
    failing_pipeline: &'static str,
    rejected: AtomicU64,
}

impl FailingComputeBackend {
    /// Backend with every built-in kernel that rejects `pipeline`.
    #[must_use]
    pub fn rejecting(pipeline: &'static str) -> Self {
        Self {
            inner: HostComputeBackend::with_builtin_kernels(),
            failing_pipeline: pipeline,
            rejected: AtomicU64::new(0),
        }
    }

    /// Number of rejected dispatches.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl ComputeBackend for FailingComputeBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn load_shader(&self, name: &str, bytecode: &[u32]) -> ComputeResult {
        self.inner.load_shader(name, bytecode)
    }

    fn is_loaded(&self, name: &str) -> bool {
        self.inner.is_loaded(name)
    }

    fn dispatch(&self, pass: &mut dyn ComputePass) -> ComputeResult<GpuFence> {
        if pass.pipeline() == self.failing_pipeline {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(ComputeError::rejected(pass.pipeline(), "injected failure"));
        }
        self.inner.dispatch(pass)
    }
}

/// Neural backend with scripted latency that blends its inputs.
///
/// The output is `(1 - t) * input0 + t * input1`, which is exact for
/// static scenes and lets tests assert on the timesteps it was asked for.
#[derive(Debug, Default)]
pub struct ScriptedNeuralBackend {
    fail_load: bool,
    delays: Vec<Duration>,
    calls: Arc<AtomicUsize>,
    timesteps: Arc<Mutex<Vec<f32>>>,
    loaded: bool,
}

/// Observation handle for a [`ScriptedNeuralBackend`].
#[derive(Debug, Clone)]
pub struct NeuralRecorder {
    calls: Arc<AtomicUsize>,
    timesteps: Arc<Mutex<Vec<f32>>>,
}

impl NeuralRecorder {
    /// Number of `run` calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Timesteps passed to `run`, in call order.
    #[must_use]
    pub fn timesteps(&self) -> Vec<f32> {
        self.timesteps.lock().clone()
    }
}

impl ScriptedNeuralBackend {
    /// A backend that loads any model and answers instantly.
    #[must_use]
    pub fn new() -> (Self, NeuralRecorder) {
        let backend = Self::default();
        let recorder = NeuralRecorder {
            calls: Arc::clone(&backend.calls),
            timesteps: Arc::clone(&backend.timesteps),
        };
        (backend, recorder)
    }

    /// Sleep `delays[i]` on the i-th call (the last entry repeats).
    #[must_use]
    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    /// Make `load` fail.
    #[must_use]
    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }
}

impl NeuralBackend for ScriptedNeuralBackend {
    fn load(&mut self, model_path: &Path) -> Result<(), InferenceError> {
        if self.fail_load {
            return Err(InferenceError::model_load(
                model_path.display().to_string(),
                "scripted failure",
            ));
        }
        self.loaded = true;
        Ok(())
    }

    fn run(&mut self, inputs: &[NamedTensor]) -> Result<Vec<NamedTensor>, InferenceError> {
        if !self.loaded {
            return Err(InferenceError::NotLoaded);
        }
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.delays.get(call).or(self.delays.last()) {
            std::thread::sleep(*delay);
        }

        let find = |name: &str| {
            NamedTensor::find(inputs, name)
                .ok_or_else(|| InferenceError::MissingTensor(name.to_string()))
        };
        let input0 = find(tensor_names::INPUT0)?;
        let input1 = find(tensor_names::INPUT1)?;
        let t = find(tensor_names::TIMESTEP)?
            .data
            .iter()
            .next()
            .copied()
            .unwrap_or(0.5);
        self.timesteps.lock().push(t);

        if input0.data.shape() != input1.data.shape() {
            return Err(InferenceError::ShapeMismatch {
                name: tensor_names::INPUT1.to_string(),
                expected: input0.data.shape().to_vec(),
                actual: input1.data.shape().to_vec(),
            });
        }
        let mut output = ArrayD::<f32>::zeros(IxDyn(input0.data.shape()));
        ndarray::Zip::from(&mut output)
            .and(&input0.data)
            .and(&input1.data)
            .for_each(|o, &a, &b| *o = (1.0 - t) * a + t * b);
        Ok(vec![NamedTensor::new(tensor_names::OUTPUT, output)])
    }
}
