//! Core data model for the FrameGen interpolation pipeline.
//!
//! This crate holds the types every stage shares:
//!
//! - [`Frame`] / [`FrameImage`]: reference-counted image handles plus capture metadata
//! - [`Plane`]: single-channel `f32` images (luma, pyramid levels, confidence)
//! - [`MotionField`]: dense per-pixel displacement with optional confidence
//! - [`EngineConfig`] / [`InterpolationMode`]: the control-plane configuration
//! - [`PerfStats`] / [`AtomicPerfStats`]: lock-free stage statistics
//! - [`GpuFence`]: completion signal attached to frames and dispatches
//! - [`ports`]: traits for the external collaborators (display, thermal, neural)
//!
//! # Example
//!
//! ```
//! use framegen_core::{Frame, FrameImage, PixelFormat};
//!
//! let image = FrameImage::filled(64, 32, PixelFormat::Rgba8, [10, 20, 30, 255])?;
//! let frame = Frame::captured(image, 0, 1_000_000);
//! assert_eq!(frame.dimensions(), (64, 32));
//! assert!(!frame.is_synthetic());
//! # Ok::<(), framegen_core::ValidationError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod clock;
pub mod config;
pub mod fence;
pub mod frame;
pub mod motion;
pub mod plane;
pub mod ports;
pub mod prelude;
pub mod stats;

pub use config::{
    EngineConfig, InterpolationMode, MotionParams, MAX_MODEL_SCALE, MIN_MODEL_SCALE,
    scale_for_quality,
};
pub use fence::GpuFence;
pub use frame::{Frame, FrameImage, FrameOrigin, PixelFormat};
pub use framegen_errors::ValidationError;
pub use motion::MotionField;
pub use plane::Plane;
pub use ports::{DisplaySink, FrameSource, NamedTensor, NeuralBackend, ThermalSensor};
pub use stats::{AtomicPerfStats, PerfStats, STATS_LEN};

/// Default per-frame interpolation budget (8 ms).
pub const DEFAULT_FRAME_BUDGET_NS: u64 = 8_000_000;

/// Default target display refresh rate in Hz.
pub const DEFAULT_REFRESH_RATE_HZ: u32 = 120;
