//! Property tests for timestep spacing and knob clamping.

use std::sync::Arc;

use framegen_compute::HostComputeBackend;
use framegen_core::{EngineConfig, MAX_MODEL_SCALE, MIN_MODEL_SCALE};
use framegen_interp::{InterpolationEngine, ModelExtent, PAD_MULTIPLE, timesteps};
use quickcheck_macros::quickcheck;

#[quickcheck]
fn timesteps_are_evenly_spaced_inside_the_interval(count: u8) -> bool {
    let count = usize::from(count % 16);
    let ts = timesteps(count);
    let step = 1.0 / (count + 1) as f32;
    ts.len() == count
        && ts.iter().all(|&t| t > 0.0 && t < 1.0)
        && ts.windows(2).all(|w| w[0] < w[1] && ((w[1] - w[0]) - step).abs() < 1e-5)
}

#[quickcheck]
fn adaptive_knobs_stay_in_range(quality: f32, scale: f32) -> bool {
    let Ok(mut engine) = InterpolationEngine::new(
        &EngineConfig::default(),
        Arc::new(HostComputeBackend::with_builtin_kernels()),
        None,
    ) else {
        return false;
    };
    engine.apply_adaptive(quality, scale);
    (0.0..=1.0).contains(&engine.quality())
        && (MIN_MODEL_SCALE..=MAX_MODEL_SCALE).contains(&engine.model_scale())
}

#[quickcheck]
fn model_extent_is_padded(width: u16, height: u16, tier: u8) -> bool {
    let width = u32::from(width % 4096) + 1;
    let height = u32::from(height % 4096) + 1;
    let scale = [0.25f32, 0.5, 0.75, 1.0][usize::from(tier % 4)];
    let extent = ModelExtent::new(width, height, scale);
    extent.padded_width % PAD_MULTIPLE == 0
        && extent.padded_height % PAD_MULTIPLE == 0
        && extent.padded_width >= extent.width
        && extent.padded_height >= extent.height
        && extent.padded_width - extent.width < PAD_MULTIPLE
}
