//! Frame interpolation for FrameGen.
//!
//! An [`InterpolationEngine`] synthesizes frames at timesteps in `(0, 1)`
//! between two source frames with one of two strategies, chosen once when
//! the engine is built:
//!
//! - **Neural**: both frames are resampled to `model_scale`, padded to a
//!   multiple of 32 and fed as NCHW tensors to a [`NeuralBackend`], together
//!   with the timestep.
//! - **Fallback**: bidirectional optical flow at `model_scale`, both frames
//!   warped toward `t` and blended with weight `t`. Pixels with low flow
//!   confidence fade toward a plain cross-fade.
//!
//! Every call is checked against the per-frame budget; a late frame is an
//! error, never a result.
//!
//! [`NeuralBackend`]: framegen_core::NeuralBackend

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod engine;
pub mod fallback;
pub mod neural;
pub mod strategy;
pub mod warp;

pub use engine::{InterpolationEngine, timesteps};
pub use fallback::{FlowStrategy, scaled_extent};
pub use framegen_errors::InterpolationError;
pub use neural::{ModelExtent, NeuralStrategy, PAD_MULTIPLE};
pub use strategy::{Strategy, StrategyKind};
