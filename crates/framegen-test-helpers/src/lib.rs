//! Shared test utilities for FrameGen.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`fixtures`] - Deterministic textured frames with known motion
//! - [`mock`] - Mock collaborators (sinks and backends)
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! framegen-test-helpers = { workspace = true }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::panic, reason = "test helpers panic on failed expectations")]

pub mod fixtures;
pub mod must;

#[cfg(feature = "mock")]
pub mod mock;

pub use must::*;
