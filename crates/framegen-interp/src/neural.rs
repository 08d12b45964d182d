//! Neural strategy: tensor layout around a pretrained interpolation model.

use std::path::{Path, PathBuf};

use framegen_core::ports::tensor_names;
use framegen_core::{Frame, FrameImage, NamedTensor, NeuralBackend};
use framegen_errors::{InferenceError, InterpolationError};
use ndarray::{Array4, ArrayD, Ix4, IxDyn};
use tracing::info;

use crate::fallback::scaled_extent;

/// Model input sizes are padded up to a multiple of this.
pub const PAD_MULTIPLE: u32 = 32;

/// Resolution of the model's input tensors for one frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelExtent {
    /// Scaled content width
    pub width: u32,
    /// Scaled content height
    pub height: u32,
    /// Padded tensor width
    pub padded_width: u32,
    /// Padded tensor height
    pub padded_height: u32,
}

impl ModelExtent {
    /// Extent for a `width x height` frame at `scale`.
    #[must_use]
    pub fn new(width: u32, height: u32, scale: f32) -> Self {
        let (sw, sh) = scaled_extent(width, height, scale);
        Self {
            width: sw,
            height: sh,
            padded_width: sw.div_ceil(PAD_MULTIPLE) * PAD_MULTIPLE,
            padded_height: sh.div_ceil(PAD_MULTIPLE) * PAD_MULTIPLE,
        }
    }

    /// NCHW shape of an image tensor.
    #[must_use]
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.padded_height as usize, self.padded_width as usize]
    }
}

/// `[1, 3, H, W]` tensor of `image` resampled to `extent`, values in `[0, 1]`.
///
/// The padding replicates the last content row and column.
#[must_use]
pub fn image_to_tensor(image: &FrameImage, extent: ModelExtent) -> ArrayD<f32> {
    let (w, h) = image.dimensions();
    let sx = w as f32 / extent.width as f32;
    let sy = h as f32 / extent.height as f32;
    let mut tensor = Array4::<f32>::zeros(extent.shape());
    for py in 0..extent.padded_height {
        let cy = py.min(extent.height - 1);
        let src_y = (cy as f32 + 0.5) * sy - 0.5;
        for px in 0..extent.padded_width {
            let cx = px.min(extent.width - 1);
            let src_x = (cx as f32 + 0.5) * sx - 0.5;
            let rgba = image.sample_rgba(src_x, src_y);
            for c in 0..3 {
                tensor[[0, c, py as usize, px as usize]] = rgba[c] / 255.0;
            }
        }
    }
    tensor.into_dyn()
}

/// Decode a model output back to a full-resolution image.
///
/// # Errors
///
/// Returns [`InferenceError::ShapeMismatch`] if the tensor is not
/// `[1, 3, padded_height, padded_width]`.
pub fn tensor_to_image(
    tensor: &ArrayD<f32>,
    extent: ModelExtent,
    like: &FrameImage,
) -> Result<FrameImage, InterpolationError> {
    let expected = extent.shape();
    let view = tensor
        .view()
        .into_dimensionality::<Ix4>()
        .ok()
        .filter(|v| v.shape() == expected.as_slice())
        .ok_or_else(|| InferenceError::ShapeMismatch {
            name: tensor_names::OUTPUT.to_string(),
            expected: expected.to_vec(),
            actual: tensor.shape().to_vec(),
        })?;

    let (w, h) = like.dimensions();
    let mut image = FrameImage::new(w, h, like.format())?;
    let sx = extent.width as f32 / w as f32;
    let sy = extent.height as f32 / h as f32;
    let max_x = (extent.width - 1) as f32;
    let max_y = (extent.height - 1) as f32;
    for y in 0..h {
        let ty = ((y as f32 + 0.5) * sy - 0.5).clamp(0.0, max_y);
        let (y0, fy) = (ty.floor() as usize, ty.fract());
        let y1 = (y0 + 1).min(extent.height as usize - 1);
        for x in 0..w {
            let tx = ((x as f32 + 0.5) * sx - 0.5).clamp(0.0, max_x);
            let (x0, fx) = (tx.floor() as usize, tx.fract());
            let x1 = (x0 + 1).min(extent.width as usize - 1);
            let mut rgba = [255u8; 4];
            for (c, out) in rgba.iter_mut().take(3).enumerate() {
                let top = view[[0, c, y0, x0]] * (1.0 - fx) + view[[0, c, y0, x1]] * fx;
                let bottom = view[[0, c, y1, x0]] * (1.0 - fx) + view[[0, c, y1, x1]] * fx;
                let v = top * (1.0 - fy) + bottom * fy;
                *out = (v * 255.0).round().clamp(0.0, 255.0) as u8;
            }
            image.set_rgba(x, y, rgba);
        }
    }
    Ok(image)
}

/// Interpolation through a loaded neural backend.
pub struct NeuralStrategy {
    backend: Box<dyn NeuralBackend>,
    model_path: PathBuf,
}

impl std::fmt::Debug for NeuralStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeuralStrategy")
            .field("model_path", &self.model_path)
            .finish_non_exhaustive()
    }
}

impl NeuralStrategy {
    /// Load `model_path` into `backend`.
    ///
    /// # Errors
    ///
    /// Returns the backend's load error; the caller falls back to flow.
    pub fn load(mut backend: Box<dyn NeuralBackend>, model_path: &Path) -> Result<Self, InferenceError> {
        backend.load(model_path)?;
        info!(model = %model_path.display(), "Neural interpolation model loaded");
        Ok(Self {
            backend,
            model_path: model_path.to_path_buf(),
        })
    }

    /// Path of the loaded model.
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Run the model for timestep `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the output is malformed.
    pub fn synthesize(
        &mut self,
        a: &Frame,
        b: &Frame,
        t: f32,
        model_scale: f32,
    ) -> Result<FrameImage, InterpolationError> {
        let (w, h) = a.dimensions();
        let extent = ModelExtent::new(w, h, model_scale);
        let inputs = [
            NamedTensor::new(tensor_names::INPUT0, image_to_tensor(a.image(), extent)),
            NamedTensor::new(tensor_names::INPUT1, image_to_tensor(b.image(), extent)),
            NamedTensor::new(tensor_names::TIMESTEP, ArrayD::from_elem(IxDyn(&[1]), t)),
        ];
        let outputs = self.backend.run(&inputs)?;
        let output = NamedTensor::find(&outputs, tensor_names::OUTPUT)
            .ok_or_else(|| InferenceError::MissingTensor(tensor_names::OUTPUT.to_string()))?;
        tensor_to_image(&output.data, extent, a.image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegen_core::PixelFormat;

    #[test]
    fn test_extent_pads_to_multiple() {
        let extent = ModelExtent::new(1280, 720, 0.5);
        assert_eq!((extent.width, extent.height), (640, 360));
        assert_eq!((extent.padded_width, extent.padded_height), (640, 384));
        assert_eq!(extent.shape(), [1, 3, 384, 640]);
    }

    #[test]
    fn test_tensor_round_trip_of_solid_image() -> Result<(), InterpolationError> {
        let image = FrameImage::filled(50, 30, PixelFormat::Bgra8, [255, 128, 0, 255])?;
        let extent = ModelExtent::new(50, 30, 0.5);
        let tensor = image_to_tensor(&image, extent);
        assert_eq!(tensor.shape(), &[1, 3, 32, 32]);
        let decoded = tensor_to_image(&tensor, extent, &image)?;
        assert_eq!(decoded.format(), PixelFormat::Bgra8);
        assert_eq!(decoded.rgba_at(10, 10), [255, 128, 0, 255]);
        Ok(())
    }

    #[test]
    fn test_wrong_output_shape_rejected() -> Result<(), InterpolationError> {
        let image = FrameImage::filled(8, 8, PixelFormat::Rgba8, [0, 0, 0, 255])?;
        let extent = ModelExtent::new(8, 8, 1.0);
        let bad = ArrayD::<f32>::zeros(IxDyn(&[1, 3, 8, 8]));
        assert!(matches!(
            tensor_to_image(&bad, extent, &image),
            Err(InterpolationError::Inference(InferenceError::ShapeMismatch { .. }))
        ));
        Ok(())
    }
}
