//! Single-channel floating point images.

use framegen_errors::ValidationError;
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// A dense `f32` image stored as a `(height, width)` array.
///
/// Used for luma, pyramid levels and confidence masks.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    data: Array2<f32>,
}

impl Plane {
    /// Create a plane with every sample set to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDimensions`] if either dimension is zero.
    pub fn filled(width: u32, height: u32, value: f32) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data: Array2::from_elem((height as usize, width as usize), value),
        })
    }

    /// Create a zero-filled plane.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDimensions`] if either dimension is zero.
    pub fn zeros(width: u32, height: u32) -> Result<Self, ValidationError> {
        Self::filled(width, height, 0.0)
    }

    /// Wrap a row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or `data` has the wrong length.
    pub fn from_vec(width: u32, height: u32, data: Vec<f32>) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(ValidationError::buffer_size("plane", expected, data.len()));
        }
        let data = Array2::from_shape_vec((height as usize, width as usize), data)
            .map_err(|err| ValidationError::ConstraintViolation(format!("plane shape: {err}")))?;
        Ok(Self { data })
    }

    /// Wrap an array shaped `(height, width)`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDimensions`] if the array is empty
    /// or too large for `u32` dimensions.
    pub fn from_array(data: Array2<f32>) -> Result<Self, ValidationError> {
        let (rows, cols) = data.dim();
        let width = u32::try_from(cols).unwrap_or(0);
        let height = u32::try_from(rows).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(ValidationError::InvalidDimensions { width, height });
        }
        Ok(Self { data })
    }

    /// Width in samples.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.data.ncols() as u32
    }

    /// Height in samples.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.data.nrows() as u32
    }

    /// `(width, height)`.
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Number of samples.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`; planes have at least one sample.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Samples indexed `[[y, x]]`.
    #[inline]
    #[must_use]
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Mutable samples indexed `[[y, x]]`.
    #[inline]
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, f32> {
        self.data.view_mut()
    }

    /// Unwrap into the backing array.
    #[must_use]
    pub fn into_array(self) -> Array2<f32> {
        self.data
    }

    /// Sample at `(x, y)`, clamped to the plane edge.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        let (rows, cols) = self.data.dim();
        self.data[[(y as usize).min(rows - 1), (x as usize).min(cols - 1)]]
    }

    /// Sample at signed coordinates, clamped to the plane edge.
    #[inline]
    #[must_use]
    pub fn get_clamped(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, i64::from(self.width()) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height()) - 1) as usize;
        self.data[[y, x]]
    }

    /// Write a sample; out-of-range writes are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        if let Some(sample) = self.data.get_mut([y as usize, x as usize]) {
            *sample = value;
        }
    }

    /// Bilinear sample at a sub-pixel position with edge clamping.
    #[must_use]
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        sample_bilinear(self.data.view(), x, y)
    }

    /// Mean of all samples.
    #[must_use]
    pub fn mean(&self) -> f32 {
        let sum: f64 = self.data.iter().map(|&v| f64::from(v)).sum();
        (sum / self.data.len() as f64) as f32
    }
}

/// Bilinear sample of a `(height, width)` view with edge clamping.
///
/// The view must be non-empty.
#[must_use]
pub fn sample_bilinear(view: ArrayView2<'_, f32>, x: f32, y: f32) -> f32 {
    let (rows, cols) = view.dim();
    let x = x.clamp(0.0, (cols - 1) as f32);
    let y = y.clamp(0.0, (rows - 1) as f32);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let x1 = (x0 + 1).min(cols - 1);
    let y1 = (y0 + 1).min(rows - 1);
    let top = view[[y0, x0]] * (1.0 - fx) + view[[y0, x1]] * fx;
    let bottom = view[[y1, x0]] * (1.0 - fx) + view[[y1, x1]] * fx;
    top * (1.0 - fy) + bottom * fy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_access() -> Result<(), ValidationError> {
        let plane = Plane::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0])?;
        assert!((plane.get_clamped(-5, -5) - 1.0).abs() < 1e-6);
        assert!((plane.get_clamped(10, 10) - 4.0).abs() < 1e-6);
        assert!((plane.get(1, 0) - 2.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_bilinear_center() -> Result<(), ValidationError> {
        let plane = Plane::from_vec(2, 2, vec![0.0, 1.0, 2.0, 3.0])?;
        assert!((plane.sample_bilinear(0.5, 0.5) - 1.5).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(Plane::from_vec(3, 3, vec![0.0; 8]).is_err());
    }

    #[test]
    fn test_view_is_row_major() -> Result<(), ValidationError> {
        let mut plane = Plane::from_vec(3, 2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])?;
        assert_eq!(plane.view().dim(), (2, 3));
        assert!((plane.view()[[1, 0]] - 3.0).abs() < 1e-6);
        plane.view_mut().row_mut(0).fill(9.0);
        assert!((plane.get(2, 0) - 9.0).abs() < 1e-6);
        assert!((plane.get(2, 1) - 5.0).abs() < 1e-6);
        plane.set(3, 0, -1.0);
        assert_eq!(plane.len(), 6);
        Ok(())
    }

    #[test]
    fn test_mean() -> Result<(), ValidationError> {
        let plane = Plane::from_vec(2, 1, vec![1.0, 3.0])?;
        assert!((plane.mean() - 2.0).abs() < 1e-6);
        Ok(())
    }
}
