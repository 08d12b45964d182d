//! Dense motion fields.

use framegen_errors::ValidationError;
use ndarray::{Array2, ArrayView2, Zip};

use crate::plane::{self, Plane};

/// Per-pixel displacement `(dx, dy)` with an optional confidence channel.
///
/// A field maps a pixel `p` in the source image to `p + (dx, dy)` in the
/// target image. It is only meaningful at the resolution it was computed at;
/// use [`MotionField::resized`] to move it to another resolution.
///
/// Each channel is a `(height, width)` array.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionField {
    dx: Array2<f32>,
    dy: Array2<f32>,
    confidence: Option<Array2<f32>>,
}

impl MotionField {
    /// Create an all-zero field.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDimensions`] if either dimension is zero.
    pub fn zeros(width: u32, height: u32) -> Result<Self, ValidationError> {
        Self::uniform(width, height, 0.0, 0.0)
    }

    /// Create a field where every pixel moves by the same vector.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDimensions`] if either dimension is zero.
    pub fn uniform(width: u32, height: u32, dx: f32, dy: f32) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::InvalidDimensions { width, height });
        }
        let shape = (height as usize, width as usize);
        Ok(Self {
            dx: Array2::from_elem(shape, dx),
            dy: Array2::from_elem(shape, dy),
            confidence: None,
        })
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.dx.ncols() as u32
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.dx.nrows() as u32
    }

    /// `(width, height)`.
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Whether this field was computed for a `width x height` image.
    #[inline]
    #[must_use]
    pub fn is_valid_for(&self, width: u32, height: u32) -> bool {
        self.dimensions() == (width, height)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> [usize; 2] {
        let (rows, cols) = self.dx.dim();
        [(y as usize).min(rows - 1), (x as usize).min(cols - 1)]
    }

    /// Displacement at `(x, y)`, clamped to the field edge.
    #[inline]
    #[must_use]
    pub fn vector(&self, x: u32, y: u32) -> (f32, f32) {
        let i = self.index(x, y);
        (self.dx[i], self.dy[i])
    }

    /// Set the displacement at `(x, y)`; out-of-range writes are ignored.
    #[inline]
    pub fn set_vector(&mut self, x: u32, y: u32, dx: f32, dy: f32) {
        let i = [y as usize, x as usize];
        if let (Some(vx), Some(vy)) = (self.dx.get_mut(i), self.dy.get_mut(i)) {
            *vx = dx;
            *vy = dy;
        }
    }

    /// Horizontal components indexed `[[y, x]]`.
    #[must_use]
    pub fn dx(&self) -> ArrayView2<'_, f32> {
        self.dx.view()
    }

    /// Vertical components indexed `[[y, x]]`.
    #[must_use]
    pub fn dy(&self) -> ArrayView2<'_, f32> {
        self.dy.view()
    }

    /// Bilinearly sample the displacement at a sub-pixel position.
    #[must_use]
    pub fn sample_bilinear(&self, x: f32, y: f32) -> (f32, f32) {
        (
            plane::sample_bilinear(self.dx.view(), x, y),
            plane::sample_bilinear(self.dy.view(), x, y),
        )
    }

    /// Attach a confidence channel.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if the plane does not
    /// match the field resolution.
    pub fn set_confidence(&mut self, confidence: Plane) -> Result<(), ValidationError> {
        if !self.is_valid_for(confidence.width(), confidence.height()) {
            return Err(ValidationError::dimension_mismatch(
                self.dimensions(),
                confidence.dimensions(),
            ));
        }
        self.confidence = Some(confidence.into_array());
        Ok(())
    }

    /// Confidence at `(x, y)`, if a confidence channel is attached.
    #[must_use]
    pub fn confidence_at(&self, x: u32, y: u32) -> Option<f32> {
        let i = self.index(x, y);
        self.confidence.as_ref().map(|c| c[i])
    }

    /// Whether a confidence channel is attached.
    #[must_use]
    pub fn has_confidence(&self) -> bool {
        self.confidence.is_some()
    }

    /// Largest absolute component across the field.
    #[must_use]
    pub fn max_abs_component(&self) -> f32 {
        Zip::from(&self.dx)
            .and(&self.dy)
            .fold(0.0f32, |acc, vx, vy| acc.max(vx.abs()).max(vy.abs()))
    }

    /// Mean displacement.
    #[must_use]
    pub fn mean_vector(&self) -> (f32, f32) {
        let n = self.dx.len() as f64;
        let (sx, sy) = Zip::from(&self.dx).and(&self.dy).fold(
            (0.0f64, 0.0f64),
            |(sx, sy), &vx, &vy| (sx + f64::from(vx), sy + f64::from(vy)),
        );
        ((sx / n) as f32, (sy / n) as f32)
    }

    /// Resample to another resolution, rescaling vectors to the new pixel grid.
    ///
    /// The confidence channel, if any, is resampled without scaling.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDimensions`] if either dimension is zero.
    pub fn resized(&self, width: u32, height: u32) -> Result<Self, ValidationError> {
        if self.is_valid_for(width, height) {
            return Ok(self.clone());
        }
        let mut out = Self::zeros(width, height)?;
        let sx = self.width() as f32 / width as f32;
        let sy = self.height() as f32 / height as f32;
        let source = |x: usize, y: usize| ((x as f32 + 0.5) * sx - 0.5, (y as f32 + 0.5) * sy - 0.5);

        Zip::indexed(&mut out.dx)
            .and(&mut out.dy)
            .for_each(|(y, x), dx, dy| {
                let (src_x, src_y) = source(x, y);
                let (vx, vy) = self.sample_bilinear(src_x, src_y);
                *dx = vx / sx;
                *dy = vy / sy;
            });

        let shape = out.dx.raw_dim();
        out.confidence = self.confidence.as_ref().map(|src| {
            Array2::from_shape_fn(shape, |(y, x)| {
                let (src_x, src_y) = source(x, y);
                plane::sample_bilinear(src.view(), src_x, src_y)
            })
        });
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_field() -> Result<(), ValidationError> {
        let field = MotionField::zeros(8, 4)?;
        assert_eq!(field.dimensions(), (8, 4));
        assert!(field.max_abs_component() < f32::EPSILON);
        assert!(!field.has_confidence());
        Ok(())
    }

    #[test]
    fn test_resize_scales_vectors() -> Result<(), ValidationError> {
        let field = MotionField::uniform(8, 8, 2.0, -1.0)?;
        let up = field.resized(16, 16)?;
        let (dx, dy) = up.vector(5, 9);
        assert!((dx - 4.0).abs() < 1e-5);
        assert!((dy + 2.0).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_confidence_must_match() -> Result<(), ValidationError> {
        let mut field = MotionField::zeros(4, 4)?;
        assert!(field.set_confidence(Plane::zeros(2, 2)?).is_err());
        field.set_confidence(Plane::filled(4, 4, 0.5)?)?;
        assert_eq!(field.confidence_at(1, 1), Some(0.5));
        Ok(())
    }

    #[test]
    fn test_resize_carries_confidence() -> Result<(), ValidationError> {
        let mut field = MotionField::zeros(4, 4)?;
        field.set_confidence(Plane::filled(4, 4, 1.0)?)?;
        let up = field.resized(8, 8)?;
        let c = up.confidence_at(3, 3).unwrap_or(0.0);
        assert!((c - 1.0).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_channels_are_row_major_arrays() -> Result<(), ValidationError> {
        let mut field = MotionField::zeros(3, 2)?;
        field.set_vector(2, 1, -4.0, 1.5);
        field.set_vector(3, 0, 9.0, 9.0);
        assert_eq!(field.dx().dim(), (2, 3));
        assert!((field.dx()[[1, 2]] + 4.0).abs() < 1e-6);
        assert!((field.dy()[[1, 2]] - 1.5).abs() < 1e-6);
        assert!((field.max_abs_component() - 4.0).abs() < 1e-6);
        let (mx, my) = field.mean_vector();
        assert!((mx + 4.0 / 6.0).abs() < 1e-6);
        assert!((my - 0.25).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_vector_clamps() -> Result<(), ValidationError> {
        let mut field = MotionField::zeros(2, 2)?;
        field.set_vector(1, 1, 3.0, 4.0);
        assert_eq!(field.vector(10, 10), (3.0, 4.0));
        Ok(())
    }
}
