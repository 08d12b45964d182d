//! Minimal SPIR-V module validation.

use framegen_errors::{ComputeError, ComputeResult};

/// First word of every SPIR-V module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Words in a SPIR-V module header.
pub const HEADER_WORDS: usize = 5;

/// Check the module header.
///
/// # Errors
///
/// Returns [`ComputeError::InvalidBytecode`] if the module is shorter than
/// its header or does not start with the SPIR-V magic number.
pub fn validate(name: &str, words: &[u32]) -> ComputeResult {
    if words.len() < HEADER_WORDS {
        return Err(invalid(name, format!("{} words is shorter than the header", words.len())));
    }
    if words.first().copied() != Some(SPIRV_MAGIC) {
        return Err(invalid(name, "missing SPIR-V magic number"));
    }
    Ok(())
}

/// Decode a little-endian `.spv` file into words.
///
/// # Errors
///
/// Returns [`ComputeError::InvalidBytecode`] if the byte length is not a
/// multiple of four or the header is invalid.
pub fn words_from_bytes(name: &str, bytes: &[u8]) -> ComputeResult<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(invalid(name, format!("{} bytes is not word aligned", bytes.len())));
    }
    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    validate(name, &words)?;
    Ok(words)
}

fn invalid(name: &str, reason: impl Into<String>) -> ComputeError {
    ComputeError::InvalidBytecode {
        name: name.to_string(),
        reason: reason.into(),
    }
}
