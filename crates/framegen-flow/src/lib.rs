//! Motion estimation and optical flow for FrameGen.
//!
//! [`MotionEstimator`] builds a luma pyramid for each frame and runs
//! block matching from the coarsest level down, seeding each level with
//! the doubled vectors of the level above, then refines the full-resolution
//! vectors to sub-pixel precision. [`OpticalFlowEngine`] runs the estimator
//! in both directions and scores every pixel by how well the two flows
//! agree.
//!
//! Every stage is a [`ComputePass`](framegen_compute::ComputePass):
//!
//! | pass | pipeline |
//! |---|---|
//! | [`luma::LumaPass`] | `rgb_to_gray` |
//! | [`pyramid::DownsamplePass`] | `downsample` |
//! | [`pyramid::ResamplePass`] | `resample` |
//! | [`block::BlockMatchPass`] | `block_match` |
//! | [`block::RefinePass`] | `flow_refine` |
//! | [`consistency::ConsistencyPass`] | `flow_consistency` |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use framegen_compute::HostComputeBackend;
//! use framegen_core::{MotionParams, Plane};
//! use framegen_flow::OpticalFlowEngine;
//!
//! let engine = OpticalFlowEngine::new(
//!     Arc::new(HostComputeBackend::with_builtin_kernels()),
//!     MotionParams::default(),
//! )?;
//! let plane = Plane::filled(32, 32, 0.5)?;
//! let flow = engine.compute_bidirectional_luma(&plane, &plane)?;
//! assert_eq!(flow.occluded_pixels, 0);
//! # Ok::<(), framegen_errors::MotionError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod block;
pub mod consistency;
pub mod estimator;
pub mod luma;
pub mod optical_flow;
pub mod pyramid;

pub use estimator::{FlowDirection, MotionEstimate, MotionEstimator};
pub use framegen_errors::MotionError;
pub use luma::{luma_of, to_luma};
pub use optical_flow::{FlowResult, OpticalFlowEngine};
pub use pyramid::{Pyramid, resample};
