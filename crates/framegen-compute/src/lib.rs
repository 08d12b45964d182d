//! Compute-dispatch contract for the FrameGen pipeline stages.
//!
//! Every algorithmic stage is expressed as a [`ComputePass`] dispatched
//! through a [`ComputeBackend`]. A pass names its pipeline, its group
//! counts and its push constants, and carries a host reference
//! implementation of one work group. A GPU backend records the pipeline
//! name, group counts and push constants into a command buffer; the
//! [`HostComputeBackend`] runs the reference implementation instead.
//!
//! # Synchronization
//!
//! [`ComputeBackend::dispatch`] returns a [`GpuFence`] signaled when the
//! dispatch has completed. Stages wait on it before reading the pass
//! outputs.
//!
//! # Example
//!
//! ```
//! use framegen_compute::{ComputeBackend, HostComputeBackend, shaders};
//!
//! let backend = HostComputeBackend::with_builtin_kernels();
//! assert!(backend.is_loaded(shaders::BLOCK_MATCH));
//! ```
//!
//! [`GpuFence`]: framegen_core::GpuFence

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod backend;
pub mod host;
pub mod params;
pub mod pass;
pub mod shaders;
pub mod spirv;

pub use backend::ComputeBackend;
pub use framegen_errors::{ComputeError, ComputeResult};
pub use host::HostComputeBackend;
pub use pass::{ComputePass, GroupCounts, GroupId, TILE_SIZE};
