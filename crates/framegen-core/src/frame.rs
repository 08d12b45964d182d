//! Frame handles and their image storage.
//!
//! A [`Frame`] is a cheap, cloneable view: the pixels live in an
//! `Arc<FrameImage>` and the metadata is copied. Stages never mutate an
//! image after it has been wrapped in a frame.

use std::sync::Arc;

use framegen_errors::ValidationError;
use serde::{Deserialize, Serialize};

use crate::fence::GpuFence;

/// Byte layout of a frame's pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8-bit red, green, blue, alpha
    #[default]
    Rgba8,
    /// 8-bit blue, green, red, alpha
    Bgra8,
}

impl PixelFormat {
    /// Bytes per pixel.
    #[inline]
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        4
    }

    /// Byte offsets of the red, green, blue and alpha channels.
    #[inline]
    #[must_use]
    pub const fn channel_offsets(self) -> [usize; 4] {
        match self {
            PixelFormat::Rgba8 => [0, 1, 2, 3],
            PixelFormat::Bgra8 => [2, 1, 0, 3],
        }
    }
}

/// Owned 8-bit four-channel image.
///
/// This is the host mirror of a GPU-resident image. All accessors use
/// logical RGBA channel order regardless of [`PixelFormat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl FrameImage {
    /// Create a zero-filled image.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, ValidationError> {
        let len = Self::byte_len(width, height, format)?;
        Ok(Self {
            width,
            height,
            format,
            pixels: vec![0; len],
        })
    }

    /// Wrap an existing pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or the buffer length does not
    /// match `width * height * 4`.
    pub fn from_pixels(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        let len = Self::byte_len(width, height, format)?;
        if pixels.len() != len {
            return Err(ValidationError::buffer_size("pixels", len, pixels.len()));
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// Create an image with every pixel set to `rgba`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDimensions`] if either dimension is zero.
    pub fn filled(
        width: u32,
        height: u32,
        format: PixelFormat,
        rgba: [u8; 4],
    ) -> Result<Self, ValidationError> {
        let mut image = Self::new(width, height, format)?;
        let offsets = format.channel_offsets();
        for px in image.pixels.chunks_exact_mut(4) {
            for (channel, &offset) in offsets.iter().enumerate() {
                px[offset] = rgba[channel];
            }
        }
        Ok(image)
    }

    fn byte_len(width: u32, height: u32, format: PixelFormat) -> Result<usize, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::InvalidDimensions { width, height });
        }
        Ok(width as usize * height as usize * format.bytes_per_pixel())
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel format.
    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw pixel bytes in storage order.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable raw pixel bytes in storage order.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        (y * self.width as usize + x) * 4
    }

    /// Logical RGBA value at `(x, y)`, clamped to the image edge.
    #[must_use]
    pub fn rgba_at(&self, x: u32, y: u32) -> [u8; 4] {
        let base = self.offset(x, y);
        let [r, g, b, a] = self.format.channel_offsets();
        [
            self.pixels[base + r],
            self.pixels[base + g],
            self.pixels[base + b],
            self.pixels[base + a],
        ]
    }

    /// Write a logical RGBA value at `(x, y)`; out-of-range writes are ignored.
    pub fn set_rgba(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let base = self.offset(x, y);
        for (channel, offset) in self.format.channel_offsets().into_iter().enumerate() {
            self.pixels[base + offset] = rgba[channel];
        }
    }

    /// Bilinearly sample logical RGBA at a sub-pixel position.
    ///
    /// Coordinates are pixel centers; samples outside the image clamp to the
    /// nearest edge. Channels are returned in `[0, 255]`.
    #[must_use]
    pub fn sample_rgba(&self, x: f32, y: f32) -> [f32; 4] {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as u32, y0 as u32);
        let (x1, y1) = (x0 + 1, y0 + 1);

        let p00 = self.rgba_at(x0, y0);
        let p10 = self.rgba_at(x1, y0);
        let p01 = self.rgba_at(x0, y1);
        let p11 = self.rgba_at(x1, y1);

        let mut out = [0.0f32; 4];
        for (c, value) in out.iter_mut().enumerate() {
            let top = f32::from(p00[c]) * (1.0 - fx) + f32::from(p10[c]) * fx;
            let bottom = f32::from(p01[c]) * (1.0 - fx) + f32::from(p11[c]) * fx;
            *value = top * (1.0 - fy) + bottom * fy;
        }
        out
    }
}

/// Where a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FrameOrigin {
    /// Produced by the frame source
    #[default]
    Captured,
    /// Produced by interpolation between two captured frames
    Synthetic {
        /// Position between the endpoints, in (0, 1)
        timestep: f32,
        /// Index of the earlier endpoint
        from_index: u64,
        /// Index of the later endpoint
        to_index: u64,
    },
}

/// An image handle plus capture metadata.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Shared pixel storage
    pub image: Arc<FrameImage>,
    /// Capture timestamp in monotonic nanoseconds
    pub timestamp_ns: u64,
    /// Monotonically increasing source index
    pub frame_index: u64,
    /// Captured or synthetic
    pub origin: FrameOrigin,
    /// Signaled once the pixels are fully written
    pub ready: GpuFence,
}

impl Frame {
    /// Wrap a captured image whose pixels are already complete.
    #[must_use]
    pub fn captured(image: FrameImage, frame_index: u64, timestamp_ns: u64) -> Self {
        Self {
            image: Arc::new(image),
            timestamp_ns,
            frame_index,
            origin: FrameOrigin::Captured,
            ready: GpuFence::signaled(),
        }
    }

    /// Build a synthetic frame lying at `timestep` between `from` and `to`.
    ///
    /// The timestamp is interpolated linearly between the endpoints and the
    /// frame index is inherited from `from`.
    #[must_use]
    pub fn synthetic(image: FrameImage, from: &Frame, to: &Frame, timestep: f32, ready: GpuFence) -> Self {
        let span = to.timestamp_ns.saturating_sub(from.timestamp_ns) as f64;
        let offset = (span * f64::from(timestep.clamp(0.0, 1.0))) as u64;
        Self {
            image: Arc::new(image),
            timestamp_ns: from.timestamp_ns.saturating_add(offset),
            frame_index: from.frame_index,
            origin: FrameOrigin::Synthetic {
                timestep,
                from_index: from.frame_index,
                to_index: to.frame_index,
            },
            ready,
        }
    }

    /// Replace the readiness fence.
    #[must_use]
    pub fn with_fence(mut self, ready: GpuFence) -> Self {
        self.ready = ready;
        self
    }

    /// Whether this frame was produced by interpolation.
    #[inline]
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self.origin, FrameOrigin::Synthetic { .. })
    }

    /// Timestep of a synthetic frame.
    #[must_use]
    pub fn timestep(&self) -> Option<f32> {
        match self.origin {
            FrameOrigin::Synthetic { timestep, .. } => Some(timestep),
            FrameOrigin::Captured => None,
        }
    }

    /// The underlying image.
    #[inline]
    #[must_use]
    pub fn image(&self) -> &FrameImage {
        &self.image
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)`.
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Pixel format.
    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.image.format()
    }
}
