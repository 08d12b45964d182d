//! Flow-based warping (`frame_warp`) and blending (`frame_blend`).
//!
//! Intermediate flows use the quadratic approximation
//!
//! ```text
//! F_t0 = -(1 - t) t F01 + t^2 F10
//! F_t1 = (1 - t)^2 F01 - t (1 - t) F10
//! ```
//!
//! and both source frames are backward-warped toward `t`.

use framegen_compute::params::TimestepParams;
use framegen_compute::{ComputePass, GroupCounts, GroupId, TILE_SIZE, shaders};
use framegen_core::{FrameImage, MotionField, Plane};
use framegen_errors::ValidationError;
use ndarray::{Array3, ArrayView1, ArrayView3, Axis, Zip, s};

/// Intermediate flows at `(x, y)` for timestep `t`: `(F_t0, F_t1)`.
#[inline]
#[must_use]
pub fn intermediate_flows(forward: (f32, f32), backward: (f32, f32), t: f32) -> ((f32, f32), (f32, f32)) {
    let a = -(1.0 - t) * t;
    let b = t * t;
    let c = (1.0 - t) * (1.0 - t);
    let d = -t * (1.0 - t);
    (
        (a * forward.0 + b * backward.0, a * forward.1 + b * backward.1),
        (c * forward.0 + d * backward.0, c * forward.1 + d * backward.1),
    )
}

/// Full-precision RGBA image, channels in `[0, 255]`.
///
/// Stored as a `(height, width, 4)` array.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaBuffer {
    data: Array3<f32>,
}

impl RgbaBuffer {
    /// Zero-filled buffer.
    #[must_use]
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            data: Array3::zeros((height as usize, width as usize, 4)),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.data.dim().1 as u32
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.data.dim().0 as u32
    }

    /// Samples indexed `[[y, x, channel]]`.
    #[must_use]
    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// Pixel at `(x, y)`, clamped to the edge.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        let (rows, cols, _) = self.data.dim();
        if rows == 0 || cols == 0 {
            return [0.0; 4];
        }
        let px = self
            .data
            .slice(s![(y as usize).min(rows - 1), (x as usize).min(cols - 1), ..]);
        [px[0], px[1], px[2], px[3]]
    }

    #[cfg(test)]
    fn set(&mut self, x: u32, y: u32, value: [f32; 4]) {
        let (rows, cols, _) = self.data.dim();
        if (x as usize) < cols && (y as usize) < rows {
            self.data
                .slice_mut(s![y as usize, x as usize, ..])
                .assign(&ArrayView1::from(&value));
        }
    }
}

/// Warps both source frames toward `t`; group `z` selects the source.
pub struct WarpPass<'a> {
    a: &'a FrameImage,
    b: &'a FrameImage,
    forward: &'a MotionField,
    backward: &'a MotionField,
    warped: [RgbaBuffer; 2],
    params: TimestepParams,
}

impl<'a> WarpPass<'a> {
    /// Bind both frames and their full-resolution flows.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if any input differs
    /// in size from `a`.
    pub fn new(
        a: &'a FrameImage,
        b: &'a FrameImage,
        forward: &'a MotionField,
        backward: &'a MotionField,
        timestep: f32,
    ) -> Result<Self, ValidationError> {
        let (width, height) = a.dimensions();
        for dims in [b.dimensions(), forward.dimensions(), backward.dimensions()] {
            if dims != (width, height) {
                return Err(ValidationError::dimension_mismatch((width, height), dims));
            }
        }
        Ok(Self {
            a,
            b,
            forward,
            backward,
            warped: [RgbaBuffer::zeros(width, height), RgbaBuffer::zeros(width, height)],
            params: TimestepParams {
                width,
                height,
                timestep,
                _pad: 0,
            },
        })
    }

    /// The frame warped from `a` and from `b`.
    #[must_use]
    pub fn into_output(self) -> [RgbaBuffer; 2] {
        self.warped
    }
}

impl ComputePass for WarpPass<'_> {
    fn pipeline(&self) -> &'static str {
        shaders::FRAME_WARP
    }

    fn groups(&self) -> GroupCounts {
        let grid = GroupCounts::covering(self.params.width, self.params.height, TILE_SIZE);
        GroupCounts::new(grid.x, grid.y, 2)
    }

    fn push_constants(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    fn run_group(&mut self, group: GroupId) {
        let t = self.params.timestep;
        let (xs, ys) = group.tile(TILE_SIZE, self.params.width, self.params.height);
        let from_b = group.z == 1;
        let source = if from_b { self.b } else { self.a };
        let (forward, backward) = (self.forward, self.backward);
        let (x0, y0) = (xs.start, ys.start);
        let mut tile = self.warped[usize::from(from_b)].data.slice_mut(s![
            ys.start as usize..ys.end as usize,
            xs.start as usize..xs.end as usize,
            ..
        ]);
        Zip::indexed(tile.lanes_mut(Axis(2))).for_each(|(ty, tx), mut px| {
            let x = x0 + tx as u32;
            let y = y0 + ty as u32;
            let (f_t0, f_t1) = intermediate_flows(forward.vector(x, y), backward.vector(x, y), t);
            let (dx, dy) = if from_b { f_t1 } else { f_t0 };
            let value = source.sample_rgba(x as f32 + dx, y as f32 + dy);
            px.assign(&ArrayView1::from(&value));
        });
    }
}

/// Blends the warped frames, falling back to a cross-fade where the flow
/// is not trusted.
///
/// `out = c * warp_blend + (1 - c) * crossfade`, with `c` the confidence at
/// the pixel's source position in `a`.
pub struct BlendPass<'a> {
    a: &'a FrameImage,
    b: &'a FrameImage,
    warped: &'a [RgbaBuffer; 2],
    forward: &'a MotionField,
    backward: &'a MotionField,
    confidence: &'a Plane,
    output: FrameImage,
    params: TimestepParams,
}

impl<'a> BlendPass<'a> {
    /// Bind the warp outputs and the confidence plane.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if the confidence
    /// plane differs in size from `a`.
    pub fn new(
        a: &'a FrameImage,
        b: &'a FrameImage,
        warped: &'a [RgbaBuffer; 2],
        forward: &'a MotionField,
        backward: &'a MotionField,
        confidence: &'a Plane,
        timestep: f32,
    ) -> Result<Self, ValidationError> {
        let (width, height) = a.dimensions();
        if confidence.dimensions() != (width, height) {
            return Err(ValidationError::dimension_mismatch(
                (width, height),
                confidence.dimensions(),
            ));
        }
        Ok(Self {
            a,
            b,
            warped,
            forward,
            backward,
            confidence,
            output: FrameImage::new(width, height, a.format())?,
            params: TimestepParams {
                width,
                height,
                timestep,
                _pad: 0,
            },
        })
    }

    /// The synthesized image.
    #[must_use]
    pub fn into_output(self) -> FrameImage {
        self.output
    }
}

impl ComputePass for BlendPass<'_> {
    fn pipeline(&self) -> &'static str {
        shaders::FRAME_BLEND
    }

    fn groups(&self) -> GroupCounts {
        GroupCounts::covering(self.params.width, self.params.height, TILE_SIZE)
    }

    fn push_constants(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    fn run_group(&mut self, group: GroupId) {
        let t = self.params.timestep;
        let (xs, ys) = group.tile(TILE_SIZE, self.params.width, self.params.height);
        for y in ys {
            for x in xs.clone() {
                let (f_t0, _) =
                    intermediate_flows(self.forward.vector(x, y), self.backward.vector(x, y), t);
                let c = self
                    .confidence
                    .sample_bilinear(x as f32 + f_t0.0, y as f32 + f_t0.1)
                    .clamp(0.0, 1.0);
                let wa = self.warped[0].get(x, y);
                let wb = self.warped[1].get(x, y);
                let pa = self.a.rgba_at(x, y);
                let pb = self.b.rgba_at(x, y);
                let mut out = [0u8; 4];
                for ch in 0..4 {
                    let warp = (1.0 - t) * wa[ch] + t * wb[ch];
                    let fade = (1.0 - t) * f32::from(pa[ch]) + t * f32::from(pb[ch]);
                    out[ch] = (c * warp + (1.0 - c) * fade).round().clamp(0.0, 255.0) as u8;
                }
                self.output.set_rgba(x, y, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_motion_splits_by_timestep() {
        let (f_t0, f_t1) = intermediate_flows((4.0, -2.0), (-4.0, 2.0), 0.25);
        assert!((f_t0.0 + 1.0).abs() < 1e-6);
        assert!((f_t0.1 - 0.5).abs() < 1e-6);
        assert!((f_t1.0 - 3.0).abs() < 1e-6);
        assert!((f_t1.1 + 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_flow_stays_zero() {
        let (f_t0, f_t1) = intermediate_flows((0.0, 0.0), (0.0, 0.0), 0.7);
        assert_eq!(f_t0, (0.0, 0.0));
        assert_eq!(f_t1, (0.0, 0.0));
    }

    #[test]
    fn test_warp_writes_only_its_tile() -> Result<(), ValidationError> {
        let (w, h) = (TILE_SIZE + 4, 3);
        let mut a = FrameImage::new(w, h, framegen_core::PixelFormat::Rgba8)?;
        for y in 0..h {
            for x in 0..w {
                a.set_rgba(x, y, [10, 20, 30, 255]);
            }
        }
        let b = a.clone();
        let flow = MotionField::zeros(w, h)?;
        let mut pass = WarpPass::new(&a, &b, &flow, &flow, 0.5)?;
        pass.run_group(GroupId { x: 1, y: 0, z: 0 });
        let [from_a, from_b] = pass.into_output();
        assert_eq!(from_a.view().dim(), (h as usize, w as usize, 4));
        let inside = from_a.get(TILE_SIZE, 2);
        assert!(inside.iter().zip([10.0, 20.0, 30.0, 255.0]).all(|(v, e)| (v - e).abs() < 1e-6));
        assert!(from_a.get(TILE_SIZE - 1, 2).iter().all(|v| v.abs() < f32::EPSILON));
        assert!(from_b.view().iter().all(|v| v.abs() < f32::EPSILON));
        Ok(())
    }

    #[test]
    fn test_buffer_clamps_reads() {
        let mut buffer = RgbaBuffer::zeros(2, 2);
        buffer.set(1, 1, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buffer.get(9, 9), [1.0, 2.0, 3.0, 4.0]);
    }
}
