//! Deterministic frame fixtures.
//!
//! Textured frames sample a fixed procedural "world" image, so a frame
//! shifted by `(dx, dy)` has real content entering at the edges instead of
//! clamped borders. For the pair `(textured_frame(.., 0, 0), textured_frame(.., dx, dy))`
//! the true forward flow is exactly `(dx, dy)` at every pixel.

use framegen_core::{Frame, FrameImage, PixelFormat};

/// Interval between fixture capture timestamps (30 Hz).
pub const FIXTURE_FRAME_INTERVAL_NS: u64 = 33_333_333;

fn hash(x: i64, y: i64, salt: u64) -> u64 {
    let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ salt.wrapping_mul(0x1656_67B1_9E37_79F9);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    h
}

fn unit(x: i64, y: i64, salt: u64) -> f32 {
    (hash(x, y, salt) % 1024) as f32 / 1023.0
}

fn value_noise(x: f32, y: f32, cell: f32, salt: u64) -> f32 {
    let fx = x / cell;
    let fy = y / cell;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let (ix, iy) = (x0 as i64, y0 as i64);
    let top = unit(ix, iy, salt) * (1.0 - tx) + unit(ix + 1, iy, salt) * tx;
    let bottom = unit(ix, iy + 1, salt) * (1.0 - tx) + unit(ix + 1, iy + 1, salt) * tx;
    top * (1.0 - ty) + bottom * ty
}

/// World intensity in `[0, 1]` at integer world coordinates.
#[must_use]
pub fn world_luma(x: i64, y: i64) -> f32 {
    let coarse = value_noise(x as f32, y as f32, 7.0, 1);
    let fine = unit(x, y, 2);
    0.65 * coarse + 0.35 * fine
}

fn world_rgba(x: i64, y: i64) -> [u8; 4] {
    let l = world_luma(x, y);
    let tint = value_noise(x as f32, y as f32, 11.0, 3);
    let r = (l * 230.0 + tint * 25.0).clamp(0.0, 255.0) as u8;
    let g = (l * 255.0).clamp(0.0, 255.0) as u8;
    let b = (l * 200.0 + (1.0 - tint) * 55.0).clamp(0.0, 255.0) as u8;
    [r, g, b, 255]
}

/// Textured frame whose content is the world shifted by `(dx, dy)`.
///
/// Pixel `(x, y)` shows world point `(x - dx, y - dy)`.
///
/// # Panics
///
/// Panics if a dimension is zero.
#[must_use]
pub fn textured_frame(width: u32, height: u32, dx: i32, dy: i32, index: u64) -> Frame {
    let mut image = match FrameImage::new(width, height, PixelFormat::Rgba8) {
        Ok(image) => image,
        Err(e) => panic!("textured_frame: {e}"),
    };
    for y in 0..height {
        for x in 0..width {
            let wx = i64::from(x) - i64::from(dx);
            let wy = i64::from(y) - i64::from(dy);
            image.set_rgba(x, y, world_rgba(wx, wy));
        }
    }
    Frame::captured(image, index, index * FIXTURE_FRAME_INTERVAL_NS)
}

/// Pair of textured frames where the second is shifted by `(dx, dy)`.
#[must_use]
pub fn shifted_pair(width: u32, height: u32, dx: i32, dy: i32) -> (Frame, Frame) {
    (
        textured_frame(width, height, 0, 0, 0),
        textured_frame(width, height, dx, dy, 1),
    )
}

/// Horizontal gradient frame; cheap to build, for tests that only need handles.
///
/// # Panics
///
/// Panics if a dimension is zero.
#[must_use]
pub fn gradient_frame(width: u32, height: u32, index: u64) -> Frame {
    let mut image = match FrameImage::new(width, height, PixelFormat::Rgba8) {
        Ok(image) => image,
        Err(e) => panic!("gradient_frame: {e}"),
    };
    for y in 0..height {
        for x in 0..width {
            let v = ((x * 255) / width.max(1)) as u8;
            image.set_rgba(x, y, [v, v, v, 255]);
        }
    }
    Frame::captured(image, index, index * FIXTURE_FRAME_INTERVAL_NS)
}

/// Frame with every pixel set to `rgba`.
///
/// # Panics
///
/// Panics if a dimension is zero.
#[must_use]
pub fn solid_frame(width: u32, height: u32, rgba: [u8; 4], index: u64) -> Frame {
    match FrameImage::filled(width, height, PixelFormat::Rgba8, rgba) {
        Ok(image) => Frame::captured(image, index, index * FIXTURE_FRAME_INTERVAL_NS),
        Err(e) => panic!("solid_frame: {e}"),
    }
}

/// Mean absolute per-channel difference between two equally sized images.
///
/// # Panics
///
/// Panics if the images differ in size.
#[must_use]
pub fn mean_abs_diff(a: &FrameImage, b: &FrameImage) -> f32 {
    assert_eq!(a.dimensions(), b.dimensions(), "images must match in size");
    let (w, h) = a.dimensions();
    let mut total = 0.0f64;
    for y in 0..h {
        for x in 0..w {
            let pa = a.rgba_at(x, y);
            let pb = b.rgba_at(x, y);
            for c in 0..3 {
                total += f64::from((i16::from(pa[c]) - i16::from(pb[c])).abs());
            }
        }
    }
    (total / (f64::from(w) * f64::from(h) * 3.0)) as f32
}
