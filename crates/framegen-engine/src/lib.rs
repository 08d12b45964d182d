//! Pipeline orchestration and the FrameGen control surface.
//!
//! A [`FrameGenEngine`] wires the stages together:
//!
//! ```text
//! CaptureHandle ──▶ captured queue ──▶ InterpolationWorker ──▶ present queue ──▶ PresentationWorker ──▶ DisplaySink
//!                                           ▲        │
//!                          ConfigCell ──────┘        └──▶ AdaptiveTimingController
//! ```
//!
//! The two workers run on named threads owned by a [`PipelineOrchestrator`]
//! and share nothing mutable except the lock-free queues. Control-plane
//! changes go through the revisioned [`ConfigCell`].
//!
//! # Example
//!
//! ```
//! use framegen_core::InterpolationMode;
//! use framegen_engine::{EngineDeps, FrameGenEngine, PipelineState};
//! use framegen_test_helpers::mock::RecordingSink;
//!
//! let (sink, _log) = RecordingSink::new();
//! let mut engine =
//!     FrameGenEngine::initialize(64, 36, InterpolationMode::Double, 0.5, 60, EngineDeps::host(sink))?;
//! assert_eq!(engine.config().max_frame_time_ns, 16_666_666);
//! engine.start()?;
//! assert_eq!(engine.state(), PipelineState::Running);
//! engine.stop()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod capture;
pub mod config;
pub mod engine;
pub mod interpolation;
pub mod orchestrator;
pub mod presentation;

pub use capture::CaptureHandle;
pub use config::{ConfigCell, from_json_str, from_yaml_str, load_config, to_yaml};
pub use engine::{EngineDeps, FrameGenEngine};
pub use interpolation::{BatchReport, InterpolationWorker};
pub use orchestrator::{INTERPOLATION_THREAD, PRESENTATION_THREAD, PipelineOrchestrator, PipelineState};
pub use presentation::{PresentOutcome, PresentationWorker};
