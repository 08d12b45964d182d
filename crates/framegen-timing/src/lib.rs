//! Timing control for FrameGen.
//!
//! - [`AdaptiveTimingController`]: trades quality for latency under load and heat
//! - [`SysfsThermalSensor`] / [`StaticThermalSensor`]: temperature sources
//! - [`PresentClock`]: absolute presentation deadlines with a busy-spin tail
//! - [`FpsMeter`]: effective output rate, recomputed once per second

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod clock;
pub mod controller;
pub mod fps;
pub mod thermal;

pub use clock::PresentClock;
pub use controller::{AdaptiveState, AdaptiveTimingController, Adjustment, TimingVerdict};
pub use fps::FpsMeter;
pub use thermal::{StaticThermalSensor, SysfsThermalSensor, parse_reading};
