//! Interfaces to the collaborators that live outside the pipeline.
//!
//! The pipeline owns none of these: hosts inject a display sink, a thermal
//! sensor and optionally a neural backend when building the engine.

use std::path::Path;
use std::time::Instant;

use framegen_errors::{InferenceError, PresentError};
use ndarray::ArrayD;

use crate::frame::Frame;

/// Tensor names of the interpolation model.
pub mod tensor_names {
    /// Earlier frame, NCHW `[1, 3, H, W]`
    pub const INPUT0: &str = "input0";
    /// Later frame, NCHW `[1, 3, H, W]`
    pub const INPUT1: &str = "input1";
    /// Scalar timestep, shape `[1]`
    pub const TIMESTEP: &str = "timestep";
    /// Synthesized frame, NCHW `[1, 3, H, W]`
    pub const OUTPUT: &str = "output";
}

/// Accepts frames for display.
pub trait DisplaySink: Send {
    /// Present `frame`, which was scheduled for `deadline`.
    ///
    /// # Errors
    ///
    /// Returns a [`PresentError`] if the sink could not take the frame. The
    /// pipeline logs and counts the failure but keeps running.
    fn present(&mut self, frame: &Frame, deadline: Instant) -> Result<(), PresentError>;
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn present(&mut self, frame: &Frame, deadline: Instant) -> Result<(), PresentError> {
        (**self).present(frame, deadline)
    }
}

/// Produces captured frames with monotonic indices and timestamps.
pub trait FrameSource: Send {
    /// Next frame, or `None` when the source is exhausted.
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Reads the device temperature.
pub trait ThermalSensor: Send + Sync {
    /// Temperature in degrees Celsius, or `None` when unknown.
    fn read_celsius(&self) -> Option<f32>;
}

/// A named inference tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTensor {
    /// Tensor name, see [`tensor_names`]
    pub name: String,
    /// Tensor data
    pub data: ArrayD<f32>,
}

impl NamedTensor {
    /// Create a named tensor.
    pub fn new(name: impl Into<String>, data: ArrayD<f32>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Find a tensor by name.
    #[must_use]
    pub fn find<'a>(tensors: &'a [NamedTensor], name: &str) -> Option<&'a NamedTensor> {
        tensors.iter().find(|t| t.name == name)
    }
}

/// A pretrained frame-interpolation model.
pub trait NeuralBackend: Send {
    /// Load the model at `model_path`.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::ModelLoad`] if the model cannot be used.
    fn load(&mut self, model_path: &Path) -> Result<(), InferenceError>;

    /// Run one inference.
    ///
    /// # Errors
    ///
    /// Returns an [`InferenceError`] if inference fails.
    fn run(&mut self, inputs: &[NamedTensor]) -> Result<Vec<NamedTensor>, InferenceError>;
}

impl<B: NeuralBackend + ?Sized> NeuralBackend for Box<B> {
    fn load(&mut self, model_path: &Path) -> Result<(), InferenceError> {
        (**self).load(model_path)
    }

    fn run(&mut self, inputs: &[NamedTensor]) -> Result<Vec<NamedTensor>, InferenceError> {
        (**self).run(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_find_tensor() {
        let tensors = vec![
            NamedTensor::new(tensor_names::TIMESTEP, ArrayD::zeros(IxDyn(&[1]))),
            NamedTensor::new(tensor_names::OUTPUT, ArrayD::zeros(IxDyn(&[1, 3, 2, 2]))),
        ];
        let output = NamedTensor::find(&tensors, tensor_names::OUTPUT);
        assert_eq!(output.map(|t| t.data.shape().to_vec()), Some(vec![1, 3, 2, 2]));
        assert!(NamedTensor::find(&tensors, "missing").is_none());
    }
}
