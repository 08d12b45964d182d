//! Pipeline names and shader-directory loading.

use std::path::Path;

use framegen_errors::InitError;
use tracing::{debug, info};

use crate::backend::ComputeBackend;
use crate::spirv;

/// RGBA to luma conversion.
pub const RGB_TO_GRAY: &str = "rgb_to_gray";
/// 2x2 box downsample of a luma plane.
pub const DOWNSAMPLE: &str = "downsample";
/// Bilinear resample of a luma plane to an arbitrary size.
pub const RESAMPLE: &str = "resample";
/// Block matching at one pyramid level.
pub const BLOCK_MATCH: &str = "block_match";
/// Sub-pixel refinement of block vectors.
pub const FLOW_REFINE: &str = "flow_refine";
/// Forward-backward consistency check.
pub const FLOW_CONSISTENCY: &str = "flow_consistency";
/// Warp both source frames toward the target timestep.
pub const FRAME_WARP: &str = "frame_warp";
/// Blend the warped frames into the synthetic frame.
pub const FRAME_BLEND: &str = "frame_blend";

/// Every pipeline the stages dispatch.
pub const BUILTIN_PIPELINES: [&str; 8] = [
    RGB_TO_GRAY,
    DOWNSAMPLE,
    RESAMPLE,
    BLOCK_MATCH,
    FLOW_REFINE,
    FLOW_CONSISTENCY,
    FRAME_WARP,
    FRAME_BLEND,
];

/// Names from `required` the backend does not have loaded.
#[must_use]
pub fn missing<'a>(backend: &dyn ComputeBackend, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|name| !backend.is_loaded(name))
        .collect()
}

/// Load `<dir>/<name>.spv` for every built-in pipeline.
///
/// # Errors
///
/// Returns [`InitError::ShaderIo`] if a file cannot be read and
/// [`InitError::Compute`] if the backend rejects a module.
pub fn load_from_dir(backend: &dyn ComputeBackend, dir: &Path) -> Result<usize, InitError> {
    let mut loaded = 0;
    for name in BUILTIN_PIPELINES {
        let path = dir.join(format!("{name}.spv"));
        let bytes = std::fs::read(&path).map_err(|source| InitError::ShaderIo {
            name: name.to_string(),
            source,
        })?;
        let words = spirv::words_from_bytes(name, &bytes)?;
        backend.load_shader(name, &words)?;
        debug!(shader = name, words = words.len(), "Loaded shader module");
        loaded += 1;
    }
    info!(dir = %dir.display(), count = loaded, backend = backend.name(), "Shader modules loaded");
    Ok(loaded)
}
