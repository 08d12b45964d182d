//! Block matching (`block_match`) and sub-pixel refinement (`flow_refine`).
//!
//! Blocks keep the same edge length at every pyramid level, so block
//! `(bx, by)` at level `k` lies inside block `(bx / 2, by / 2)` at level
//! `k + 1`. The coarser vector, doubled, seeds the finer search.

use framegen_compute::params::{BlockMatchParams, RefineParams};
use framegen_compute::{ComputePass, GroupCounts, GroupId, shaders};
use framegen_core::{MotionField, Plane};
use framegen_errors::ValidationError;

/// Costs closer than this are treated as equal.
pub const COST_EPSILON: f32 = 1e-5;

/// Sub-pixel offsets are clamped to this magnitude.
pub const MAX_SUBPIXEL_OFFSET: f32 = 0.5;

/// One displacement per block at one pyramid level.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockField {
    blocks_x: u32,
    blocks_y: u32,
    block_size: u32,
    vectors: Vec<(f32, f32)>,
}

impl BlockField {
    /// All-zero field with enough blocks to cover `width x height`.
    #[must_use]
    pub fn covering(width: u32, height: u32, block_size: u32) -> Self {
        let block_size = block_size.max(1);
        let blocks_x = width.div_ceil(block_size).max(1);
        let blocks_y = height.div_ceil(block_size).max(1);
        Self {
            blocks_x,
            blocks_y,
            block_size,
            vectors: vec![(0.0, 0.0); blocks_x as usize * blocks_y as usize],
        }
    }

    /// Blocks per row.
    #[must_use]
    pub fn blocks_x(&self) -> u32 {
        self.blocks_x
    }

    /// Blocks per column.
    #[must_use]
    pub fn blocks_y(&self) -> u32 {
        self.blocks_y
    }

    /// Block edge length.
    #[must_use]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    #[inline]
    fn index(&self, bx: u32, by: u32) -> usize {
        let bx = bx.min(self.blocks_x - 1) as usize;
        let by = by.min(self.blocks_y - 1) as usize;
        by * self.blocks_x as usize + bx
    }

    /// Vector of block `(bx, by)`, clamped to the grid.
    #[must_use]
    pub fn get(&self, bx: u32, by: u32) -> (f32, f32) {
        self.vectors[self.index(bx, by)]
    }

    /// Set the vector of block `(bx, by)`; out-of-grid writes are ignored.
    pub fn set(&mut self, bx: u32, by: u32, vector: (f32, f32)) {
        if bx < self.blocks_x && by < self.blocks_y {
            let i = self.index(bx, by);
            self.vectors[i] = vector;
        }
    }

    /// Seed for block `(bx, by)` of the next finer level.
    #[must_use]
    pub fn seed_for_finer(&self, bx: u32, by: u32) -> (f32, f32) {
        let (dx, dy) = self.get(bx / 2, by / 2);
        (dx * 2.0, dy * 2.0)
    }

    /// Expand to a dense per-pixel field.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero.
    pub fn to_dense(&self, width: u32, height: u32) -> Result<MotionField, ValidationError> {
        let mut field = MotionField::zeros(width, height)?;
        for y in 0..height {
            for x in 0..width {
                let (dx, dy) = self.get(x / self.block_size, y / self.block_size);
                field.set_vector(x, y, dx, dy);
            }
        }
        Ok(field)
    }
}

/// Sum of absolute differences between a reference block and the target
/// displaced by `(dx, dy)`. Target samples are clamped to the edge.
#[must_use]
pub fn block_sad(
    reference: &Plane,
    target: &Plane,
    x0: u32,
    y0: u32,
    block_size: u32,
    dx: i64,
    dy: i64,
) -> f32 {
    let x1 = (x0 + block_size).min(reference.width());
    let y1 = (y0 + block_size).min(reference.height());
    let mut cost = 0.0;
    for y in y0..y1 {
        for x in x0..x1 {
            let r = reference.get(x, y);
            let t = target.get_clamped(i64::from(x) + dx, i64::from(y) + dy);
            cost += (r - t).abs();
        }
    }
    cost
}

/// Block matching at one pyramid level.
///
/// Each work group handles one block.
pub struct BlockMatchPass<'a> {
    reference: &'a Plane,
    target: &'a Plane,
    seeds: Option<&'a BlockField>,
    output: BlockField,
    params: BlockMatchParams,
}

impl<'a> BlockMatchPass<'a> {
    /// Bind one level of both pyramids.
    ///
    /// `seeds` is the coarser level's result, or `None` at the coarsest level.
    #[must_use]
    pub fn new(
        reference: &'a Plane,
        target: &'a Plane,
        seeds: Option<&'a BlockField>,
        params: BlockMatchParams,
    ) -> Self {
        Self {
            reference,
            target,
            seeds,
            output: BlockField::covering(reference.width(), reference.height(), params.block_size),
            params,
        }
    }

    /// The matched block vectors.
    #[must_use]
    pub fn into_output(self) -> BlockField {
        self.output
    }

    fn search(&self, bx: u32, by: u32) -> (f32, f32) {
        let block = self.params.block_size;
        let seed = self
            .seeds
            .map_or((0.0, 0.0), |seeds| seeds.seed_for_finer(bx, by));
        let (sx, sy) = (seed.0.round() as i64, seed.1.round() as i64);
        let radius = i64::from(self.params.search_radius);
        let (x0, y0) = (bx * block, by * block);

        let mut best = (sx, sy);
        let mut best_cost = f32::INFINITY;
        let mut best_dist = i64::MAX;
        for dy in (sy - radius)..=(sy + radius) {
            for dx in (sx - radius)..=(sx + radius) {
                let cost = block_sad(self.reference, self.target, x0, y0, block, dx, dy);
                let dist = (dx - sx).pow(2) + (dy - sy).pow(2);
                let better = cost < best_cost - COST_EPSILON;
                let tie = (cost - best_cost).abs() <= COST_EPSILON && dist < best_dist;
                if better || tie {
                    best = (dx, dy);
                    best_cost = cost;
                    best_dist = dist;
                }
            }
        }
        (best.0 as f32, best.1 as f32)
    }
}

impl ComputePass for BlockMatchPass<'_> {
    fn pipeline(&self) -> &'static str {
        shaders::BLOCK_MATCH
    }

    fn groups(&self) -> GroupCounts {
        GroupCounts::new(self.output.blocks_x(), self.output.blocks_y(), 1)
    }

    fn push_constants(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    fn run_group(&mut self, group: GroupId) {
        let vector = self.search(group.x, group.y);
        self.output.set(group.x, group.y, vector);
    }
}

/// Offset of a parabola's minimum through costs at -1, 0 and +1.
#[must_use]
pub fn parabolic_offset(minus: f32, center: f32, plus: f32) -> f32 {
    if center <= COST_EPSILON {
        return 0.0;
    }
    let curvature = minus - 2.0 * center + plus;
    if curvature <= COST_EPSILON {
        return 0.0;
    }
    (0.5 * (minus - plus) / curvature).clamp(-MAX_SUBPIXEL_OFFSET, MAX_SUBPIXEL_OFFSET)
}

/// Full-resolution sub-pixel refinement producing the dense field.
pub struct RefinePass<'a> {
    reference: &'a Plane,
    target: &'a Plane,
    blocks: &'a BlockField,
    output: MotionField,
    params: RefineParams,
}

impl<'a> RefinePass<'a> {
    /// Bind the full-resolution planes and their integer block vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if the planes are empty.
    pub fn new(
        reference: &'a Plane,
        target: &'a Plane,
        blocks: &'a BlockField,
    ) -> Result<Self, ValidationError> {
        let (width, height) = reference.dimensions();
        Ok(Self {
            reference,
            target,
            blocks,
            output: MotionField::zeros(width, height)?,
            params: RefineParams {
                width,
                height,
                block_size: blocks.block_size(),
                _pad: 0,
            },
        })
    }

    /// The refined dense field.
    #[must_use]
    pub fn into_output(self) -> MotionField {
        self.output
    }
}

impl ComputePass for RefinePass<'_> {
    fn pipeline(&self) -> &'static str {
        shaders::FLOW_REFINE
    }

    fn groups(&self) -> GroupCounts {
        GroupCounts::new(self.blocks.blocks_x(), self.blocks.blocks_y(), 1)
    }

    fn push_constants(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }

    fn run_group(&mut self, group: GroupId) {
        let block = self.params.block_size;
        let (x0, y0) = (group.x * block, group.y * block);
        let (vx, vy) = self.blocks.get(group.x, group.y);
        let (dx, dy) = (vx.round() as i64, vy.round() as i64);
        let cost = |ox: i64, oy: i64| {
            block_sad(self.reference, self.target, x0, y0, block, dx + ox, dy + oy)
        };
        let center = cost(0, 0);
        let fx = parabolic_offset(cost(-1, 0), center, cost(1, 0));
        let fy = parabolic_offset(cost(0, -1), center, cost(0, 1));
        let refined = (dx as f32 + fx, dy as f32 + fy);

        let x1 = (x0 + block).min(self.params.width);
        let y1 = (y0 + block).min(self.params.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.output.set_vector(x, y, refined.0, refined.1);
            }
        }
    }
}
