//! Worker lifecycle.
//!
//! The orchestrator owns both workers. While stopped it holds them directly;
//! while running each lives on its own named thread and comes back through
//! the join handle, queue ends included, so the pipeline can be restarted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use framegen_errors::PipelineError;
use tracing::{error, info, warn};

use crate::interpolation::InterpolationWorker;
use crate::presentation::PresentationWorker;

/// Thread name of the interpolation worker.
pub const INTERPOLATION_THREAD: &str = "framegen-interp";

/// Thread name of the presentation worker.
pub const PRESENTATION_THREAD: &str = "framegen-present";

/// Lifecycle state of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Workers are parked and can be started
    Stopped,
    /// Both workers are running
    Running,
    /// A worker was lost; the pipeline cannot run again
    Failed,
}

#[derive(Debug)]
struct Workers {
    interpolation: InterpolationWorker,
    presentation: PresentationWorker,
}

#[derive(Debug)]
struct Threads {
    interpolation: JoinHandle<InterpolationWorker>,
    presentation: JoinHandle<PresentationWorker>,
}

/// Runs the interpolation and presentation workers.
#[derive(Debug)]
pub struct PipelineOrchestrator {
    running: Arc<AtomicBool>,
    idle: Option<Workers>,
    threads: Option<Threads>,
    state: PipelineState,
}

impl PipelineOrchestrator {
    /// Create a stopped pipeline.
    #[must_use]
    pub fn new(interpolation: InterpolationWorker, presentation: PresentationWorker) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            idle: Some(Workers {
                interpolation,
                presentation,
            }),
            threads: None,
            state: PipelineState::Stopped,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Whether the workers are running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == PipelineState::Running
    }

    /// The parked interpolation worker, while stopped.
    #[must_use]
    pub fn interpolation_worker(&self) -> Option<&InterpolationWorker> {
        self.idle.as_ref().map(|w| &w.interpolation)
    }

    /// The parked presentation worker, while stopped.
    #[must_use]
    pub fn presentation_worker(&self) -> Option<&PresentationWorker> {
        self.idle.as_ref().map(|w| &w.presentation)
    }

    /// Launch both workers.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::AlreadyRunning`] if the workers are running
    /// - [`PipelineError::NotRestartable`] after a worker was lost
    /// - [`PipelineError::ThreadSpawn`] if the OS refuses a thread; nothing
    ///   is left running and the pipeline is marked failed
    pub fn start(&mut self) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Running => return Err(PipelineError::AlreadyRunning),
            PipelineState::Failed => {
                return Err(PipelineError::NotRestartable(
                    "a worker was lost in an earlier run".to_string(),
                ));
            }
            PipelineState::Stopped => {}
        }
        let Some(Workers {
            interpolation,
            presentation,
        }) = self.idle.take()
        else {
            self.state = PipelineState::Failed;
            return Err(PipelineError::NotRestartable("workers are missing".to_string()));
        };

        self.running.store(true, Ordering::Release);
        let interpolation = match spawn(INTERPOLATION_THREAD, &self.running, move |running| {
            interpolation.run(running)
        }) {
            Ok(handle) => handle,
            Err(e) => {
                self.fail_start();
                return Err(e);
            }
        };
        let presentation = match spawn(PRESENTATION_THREAD, &self.running, move |running| {
            presentation.run(running)
        }) {
            Ok(handle) => handle,
            Err(e) => {
                self.fail_start();
                if interpolation.join().is_err() {
                    error!(worker = INTERPOLATION_THREAD, "Worker panicked during aborted start");
                }
                return Err(e);
            }
        };

        self.threads = Some(Threads {
            interpolation,
            presentation,
        });
        self.state = PipelineState::Running;
        info!("Pipeline started");
        Ok(())
    }

    /// Signal both workers and join them.
    ///
    /// In-flight work finishes first. Stopping a stopped pipeline is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WorkerPanicked`] if a worker panicked; the
    /// pipeline is then marked failed. Builds with `panic = "abort"` never
    /// reach this, since the panic ends the process.
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        let Some(threads) = self.threads.take() else {
            return Ok(());
        };
        info!("Stopping pipeline");
        self.running.store(false, Ordering::Release);

        let interpolation = threads.interpolation.join();
        let presentation = threads.presentation.join();
        match (interpolation, presentation) {
            (Ok(interpolation), Ok(presentation)) => {
                self.idle = Some(Workers {
                    interpolation,
                    presentation,
                });
                self.state = PipelineState::Stopped;
                info!("Pipeline stopped");
                Ok(())
            }
            (interpolation, _) => {
                self.state = PipelineState::Failed;
                let worker = if interpolation.is_err() {
                    INTERPOLATION_THREAD
                } else {
                    PRESENTATION_THREAD
                };
                error!(worker, "Worker panicked");
                Err(PipelineError::WorkerPanicked(worker))
            }
        }
    }

    fn fail_start(&mut self) {
        self.running.store(false, Ordering::Release);
        self.state = PipelineState::Failed;
    }
}

impl Drop for PipelineOrchestrator {
    fn drop(&mut self) {
        if self.threads.is_some() {
            warn!("Pipeline dropped while running, stopping workers");
            if let Err(e) = self.stop() {
                error!(error = %e, "Pipeline did not stop cleanly");
            }
        }
    }
}

fn spawn<W, F>(
    name: &'static str,
    running: &Arc<AtomicBool>,
    body: F,
) -> Result<JoinHandle<W>, PipelineError>
where
    W: Send + 'static,
    F: FnOnce(&AtomicBool) -> W + Send + 'static,
{
    let running = Arc::clone(running);
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || body(&running))
        .map_err(|e| PipelineError::ThreadSpawn {
            name,
            reason: e.to_string(),
        })
}
