//! Property-based tests for the core data model.

use framegen_core::{EngineConfig, FrameImage, MotionField, PixelFormat, Plane, scale_for_quality};
use proptest::prelude::*;
use quickcheck_macros::quickcheck;

#[quickcheck]
fn normalized_config_always_validates(
    quality: f32,
    model_scale: f32,
    capture_depth: usize,
    rate: u32,
    threshold: f32,
) -> bool {
    let mut config = EngineConfig {
        quality,
        model_scale,
        capture_queue_depth: capture_depth,
        target_refresh_rate: rate,
        ..EngineConfig::default()
    };
    config.motion.consistency_threshold = threshold;
    config.normalize();
    config.validate().is_ok()
}

#[quickcheck]
fn quality_tier_is_one_of_three(quality: f32) -> bool {
    let scale = scale_for_quality(quality);
    [0.25f32, 0.5, 0.75]
        .iter()
        .any(|tier| (tier - scale).abs() < f32::EPSILON)
}

proptest! {
    #[test]
    fn uniform_field_resizes_proportionally(
        w in 2u32..24,
        h in 2u32..24,
        factor in 1u32..4,
        dx in -8.0f32..8.0,
        dy in -8.0f32..8.0,
    ) {
        let field = MotionField::uniform(w, h, dx, dy)?;
        let resized = field.resized(w * factor, h * factor)?;
        let (rx, ry) = resized.vector(0, 0);
        prop_assert!((rx - dx * factor as f32).abs() < 1e-3);
        prop_assert!((ry - dy * factor as f32).abs() < 1e-3);
    }

    #[test]
    fn bilinear_sample_stays_in_value_range(
        values in proptest::collection::vec(0.0f32..1.0, 16),
        x in -4.0f32..8.0,
        y in -4.0f32..8.0,
    ) {
        let plane = Plane::from_vec(4, 4, values)?;
        let sample = plane.sample_bilinear(x, y);
        prop_assert!((-1e-6..=1.0 + 1e-6).contains(&sample));
    }

    #[test]
    fn rgba_sample_stays_in_byte_range(
        r in any::<u8>(),
        g in any::<u8>(),
        x in -2.0f32..6.0,
        y in -2.0f32..6.0,
    ) {
        let mut image = FrameImage::filled(4, 4, PixelFormat::Bgra8, [r, g, 0, 255])?;
        image.set_rgba(2, 2, [255 - r, 255 - g, 255, 0]);
        let px = image.sample_rgba(x, y);
        for channel in px {
            prop_assert!((0.0..=255.0).contains(&channel));
        }
    }
}
