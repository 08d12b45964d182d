//! Push-constant layouts.
//!
//! Each struct matches the push-constant block of the shader with the same
//! name, so it can be uploaded with [`bytemuck::bytes_of`].

use bytemuck::{Pod, Zeroable};

/// Extent of a single image; used by `rgb_to_gray` and `downsample`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ExtentParams {
    /// Output width
    pub width: u32,
    /// Output height
    pub height: u32,
}

/// `resample` parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ResampleParams {
    /// Source width
    pub src_width: u32,
    /// Source height
    pub src_height: u32,
    /// Destination width
    pub dst_width: u32,
    /// Destination height
    pub dst_height: u32,
}

/// `block_match` parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BlockMatchParams {
    /// Level width
    pub width: u32,
    /// Level height
    pub height: u32,
    /// Block edge length
    pub block_size: u32,
    /// Search radius at this level
    pub search_radius: u32,
    /// Pyramid level, 0 is full resolution
    pub level: u32,
    /// Pyramid depth
    pub total_levels: u32,
    /// +1 for forward flow, -1 for backward flow
    pub direction: i32,
    /// Keeps the block 16-byte aligned
    pub _pad: u32,
}

/// `flow_refine` parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RefineParams {
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Block edge length
    pub block_size: u32,
    /// Keeps the block 16-byte aligned
    pub _pad: u32,
}

/// `flow_consistency` parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ConsistencyParams {
    /// Field width
    pub width: u32,
    /// Field height
    pub height: u32,
    /// Occlusion threshold in pixels
    pub threshold: f32,
    /// Keeps the block 16-byte aligned
    pub _pad: u32,
}

/// `frame_warp` and `frame_blend` parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct TimestepParams {
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Target timestep in (0, 1)
    pub timestep: f32,
    /// Keeps the block 16-byte aligned
    pub _pad: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<BlockMatchParams>(), 32);
        assert_eq!(std::mem::size_of::<RefineParams>(), 16);
        assert_eq!(std::mem::size_of::<ConsistencyParams>(), 16);
        assert_eq!(std::mem::size_of::<TimestepParams>(), 16);
        assert_eq!(std::mem::size_of::<ResampleParams>(), 16);
    }

    #[test]
    fn test_bytes_follow_field_order() {
        let params = ExtentParams {
            width: 1,
            height: 2,
        };
        let bytes = bytemuck::bytes_of(&params);
        assert_eq!(bytes.len(), 8);
        assert_eq!(u32::from_ne_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 2);
    }
}
