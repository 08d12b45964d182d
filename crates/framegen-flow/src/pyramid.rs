//! Luma pyramids and plane resampling (`downsample`, `resample`).

use framegen_compute::params::{ExtentParams, ResampleParams};
use framegen_compute::{ComputeBackend, ComputePass, GroupCounts, GroupId, TILE_SIZE, shaders};
use framegen_core::Plane;
use framegen_errors::MotionError;

/// Halve a level: `(n + 1) / 2`.
#[inline]
#[must_use]
pub const fn half(n: u32) -> u32 {
    n.div_ceil(2)
}

/// Number of pyramid levels usable for a `width x height` base.
///
/// The coarsest level must still hold one full block in each dimension.
/// Always at least 1.
#[must_use]
pub fn usable_levels(width: u32, height: u32, block_size: u32, requested: u32) -> u32 {
    let mut levels = 1;
    let (mut w, mut h) = (width, height);
    while levels < requested {
        let (nw, nh) = (half(w), half(h));
        if nw < block_size || nh < block_size {
            break;
        }
        w = nw;
        h = nh;
        levels += 1;
    }
    levels
}

/// 2x2 box filter halving a plane.
pub struct DownsamplePass<'a> {
    src: &'a Plane,
    dst: Plane,
    params: ExtentParams,
}

impl<'a> DownsamplePass<'a> {
    /// Bind `src` and allocate the half-size output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be allocated.
    pub fn new(src: &'a Plane) -> Result<Self, MotionError> {
        let width = half(src.width());
        let height = half(src.height());
        Ok(Self {
            src,
            dst: Plane::zeros(width, height)?,
            params: ExtentParams { width, height },
        })
    }

    /// The downsampled plane.
    #[must_use]
    pub fn into_output(self) -> Plane {
        self.dst
    }
}

impl ComputePass for DownsamplePass<'_> {
    fn pipeline(&self) -> &'static str {
        shaders::DOWNSAMPLE
    }

    fn groups(&self) -> GroupCounts {
        GroupCounts::covering(self.params.width, self.params.height, TILE_SIZE)
    }

    fn push_constants(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    fn run_group(&mut self, group: GroupId) {
        let (xs, ys) = group.tile(TILE_SIZE, self.params.width, self.params.height);
        for y in ys {
            for x in xs.clone() {
                let (sx, sy) = (x * 2, y * 2);
                let sum = self.src.get(sx, sy)
                    + self.src.get(sx + 1, sy)
                    + self.src.get(sx, sy + 1)
                    + self.src.get(sx + 1, sy + 1);
                self.dst.set(x, y, sum * 0.25);
            }
        }
    }
}

/// Bilinear resample of a plane to an arbitrary size.
pub struct ResamplePass<'a> {
    src: &'a Plane,
    dst: Plane,
    params: ResampleParams,
}

impl<'a> ResamplePass<'a> {
    /// Bind `src` and allocate a `width x height` output.
    ///
    /// # Errors
    ///
    /// Returns an error if either target dimension is zero.
    pub fn new(src: &'a Plane, width: u32, height: u32) -> Result<Self, MotionError> {
        Ok(Self {
            src,
            dst: Plane::zeros(width, height)?,
            params: ResampleParams {
                src_width: src.width(),
                src_height: src.height(),
                dst_width: width,
                dst_height: height,
            },
        })
    }

    /// The resampled plane.
    #[must_use]
    pub fn into_output(self) -> Plane {
        self.dst
    }
}

impl ComputePass for ResamplePass<'_> {
    fn pipeline(&self) -> &'static str {
        shaders::RESAMPLE
    }

    fn groups(&self) -> GroupCounts {
        GroupCounts::covering(self.params.dst_width, self.params.dst_height, TILE_SIZE)
    }

    fn push_constants(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    fn run_group(&mut self, group: GroupId) {
        let p = self.params;
        let sx = p.src_width as f32 / p.dst_width as f32;
        let sy = p.src_height as f32 / p.dst_height as f32;
        let (xs, ys) = group.tile(TILE_SIZE, p.dst_width, p.dst_height);
        for y in ys {
            let src_y = (y as f32 + 0.5) * sy - 0.5;
            for x in xs.clone() {
                let src_x = (x as f32 + 0.5) * sx - 0.5;
                self.dst.set(x, y, self.src.sample_bilinear(src_x, src_y));
            }
        }
    }
}

/// Resample `plane` to `width x height`, cloning when the size already matches.
///
/// # Errors
///
/// Returns an error if a dimension is zero or the dispatch is rejected.
pub fn resample(
    backend: &dyn ComputeBackend,
    plane: &Plane,
    width: u32,
    height: u32,
) -> Result<Plane, MotionError> {
    if plane.dimensions() == (width, height) {
        return Ok(plane.clone());
    }
    let mut pass = ResamplePass::new(plane, width, height)?;
    backend.dispatch_and_wait(&mut pass)?;
    Ok(pass.into_output())
}

/// Successive halvings of a luma plane; level 0 is the base.
#[derive(Debug, Clone)]
pub struct Pyramid {
    levels: Vec<Plane>,
}

impl Pyramid {
    /// Build `levels` levels from `base` by dispatching `downsample`.
    ///
    /// # Errors
    ///
    /// Returns an error if any dispatch is rejected.
    pub fn build(backend: &dyn ComputeBackend, base: Plane, levels: u32) -> Result<Self, MotionError> {
        let mut planes = Vec::with_capacity(levels.max(1) as usize);
        planes.push(base);
        while planes.len() < levels as usize {
            let Some(prev) = planes.last() else { break };
            let mut pass = DownsamplePass::new(prev)?;
            backend.dispatch_and_wait(&mut pass)?;
            let next = pass.into_output();
            planes.push(next);
        }
        Ok(Self { levels: planes })
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the pyramid has no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Plane at `level`.
    #[must_use]
    pub fn level(&self, level: usize) -> Option<&Plane> {
        self.levels.get(level)
    }
}
