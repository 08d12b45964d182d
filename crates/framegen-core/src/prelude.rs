//! Convenience re-exports.

pub use crate::{
    AtomicPerfStats, DisplaySink, EngineConfig, Frame, FrameImage, FrameOrigin, FrameSource,
    GpuFence, InterpolationMode, MotionField, MotionParams, NamedTensor, NeuralBackend,
    PerfStats, PixelFormat, Plane, ThermalSensor,
    clock::now_ns,
    ports::tensor_names,
};
