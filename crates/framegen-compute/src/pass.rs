//! Compute pass description.

use std::ops::Range;

/// Edge length of a 2-D work group in invocations.
pub const TILE_SIZE: u32 = 16;

/// Number of work groups to dispatch along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupCounts {
    /// Groups along X
    pub x: u32,
    /// Groups along Y
    pub y: u32,
    /// Groups along Z
    pub z: u32,
}

impl GroupCounts {
    /// Create group counts.
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Groups of `tile x tile` invocations covering a `width x height` extent.
    #[must_use]
    pub const fn covering(width: u32, height: u32, tile: u32) -> Self {
        Self {
            x: width.div_ceil(tile),
            y: height.div_ceil(tile),
            z: 1,
        }
    }

    /// Total number of groups.
    #[must_use]
    pub const fn total(self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    /// Whether any axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }
}

/// Coordinates of one work group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId {
    /// Group index along X
    pub x: u32,
    /// Group index along Y
    pub y: u32,
    /// Group index along Z
    pub z: u32,
}

impl GroupId {
    /// Invocation ranges of a `tile x tile` group, clipped to the extent.
    #[must_use]
    pub fn tile(self, tile: u32, width: u32, height: u32) -> (Range<u32>, Range<u32>) {
        let x0 = (self.x * tile).min(width);
        let y0 = (self.y * tile).min(height);
        (
            x0..(x0 + tile).min(width),
            y0..(y0 + tile).min(height),
        )
    }
}

/// One dispatch of a compute pipeline with its bound resources.
///
/// Implementors hold their input and output resources, so binding happens
/// when the pass is constructed.
pub trait ComputePass {
    /// Name of the pipeline (shader) this pass runs.
    fn pipeline(&self) -> &'static str;

    /// Work-group grid.
    fn groups(&self) -> GroupCounts;

    /// Push-constant block as raw bytes.
    fn push_constants(&self) -> &[u8];

    /// Host reference implementation of a single work group.
    fn run_group(&mut self, group: GroupId);
}
