//! The compute backend trait.

use framegen_core::GpuFence;
use framegen_errors::ComputeResult;

use crate::pass::ComputePass;

/// Loads shader modules and executes compute passes.
///
/// Implementations must be shareable between the pipeline workers.
pub trait ComputeBackend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Register a SPIR-V module under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::InvalidBytecode`] if the module is malformed.
    ///
    /// [`ComputeError::InvalidBytecode`]: framegen_errors::ComputeError::InvalidBytecode
    fn load_shader(&self, name: &str, bytecode: &[u32]) -> ComputeResult;

    /// Whether a module is registered under `name`.
    fn is_loaded(&self, name: &str) -> bool;

    /// Execute `pass` and return its completion signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is not loaded, the group grid is
    /// empty, or the device rejects the work. No part of the pass output
    /// may be relied upon after an error.
    fn dispatch(&self, pass: &mut dyn ComputePass) -> ComputeResult<GpuFence>;

    /// Execute `pass` and block until it completes.
    ///
    /// # Errors
    ///
    /// Propagates any [`ComputeBackend::dispatch`] error.
    fn dispatch_and_wait(&self, pass: &mut dyn ComputePass) -> ComputeResult {
        let fence = self.dispatch(pass)?;
        fence.wait();
        Ok(())
    }
}
