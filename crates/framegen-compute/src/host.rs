//! Host reference compute backend.
//!
//! Runs every dispatched pass on the calling thread by invoking its
//! reference implementation once per work group. Dispatches are therefore
//! complete when [`HostComputeBackend::dispatch`] returns and the returned
//! fence is already signaled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use framegen_core::GpuFence;
use framegen_errors::{ComputeError, ComputeResult};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::backend::ComputeBackend;
use crate::pass::{ComputePass, GroupId};
use crate::shaders::BUILTIN_PIPELINES;
use crate::spirv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleSource {
    /// Registered SPIR-V; execution still uses the host reference kernel
    Spirv { words: usize },
    /// Registered without bytecode
    Reference,
}

/// CPU implementation of [`ComputeBackend`].
#[derive(Debug, Default)]
pub struct HostComputeBackend {
    modules: RwLock<HashMap<String, ModuleSource>>,
    dispatches: AtomicU64,
    groups: AtomicU64,
}

impl HostComputeBackend {
    /// Create a backend with no pipelines loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with every built-in pipeline registered.
    #[must_use]
    pub fn with_builtin_kernels() -> Self {
        let backend = Self::new();
        backend.register_builtin_kernels();
        backend
    }

    /// Register every built-in pipeline without bytecode.
    pub fn register_builtin_kernels(&self) {
        let mut modules = self.modules.write();
        for name in BUILTIN_PIPELINES {
            modules
                .entry(name.to_string())
                .or_insert(ModuleSource::Reference);
        }
        debug!(count = BUILTIN_PIPELINES.len(), "Registered host reference kernels");
    }

    /// Remove a pipeline; later dispatches of it fail.
    pub fn unload_shader(&self, name: &str) -> bool {
        self.modules.write().remove(name).is_some()
    }

    /// Number of completed dispatches.
    #[must_use]
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    /// Number of executed work groups.
    #[must_use]
    pub fn group_count(&self) -> u64 {
        self.groups.load(Ordering::Relaxed)
    }

    /// Names of all registered pipelines, sorted.
    #[must_use]
    pub fn loaded_shaders(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Size in words of a registered SPIR-V module.
    #[must_use]
    pub fn module_words(&self, name: &str) -> Option<usize> {
        match self.modules.read().get(name) {
            Some(ModuleSource::Spirv { words }) => Some(*words),
            _ => None,
        }
    }
}

impl ComputeBackend for HostComputeBackend {
    fn name(&self) -> &str {
        "host-reference"
    }

    fn load_shader(&self, name: &str, bytecode: &[u32]) -> ComputeResult {
        spirv::validate(name, bytecode)?;
        self.modules.write().insert(
            name.to_string(),
            ModuleSource::Spirv {
                words: bytecode.len(),
            },
        );
        Ok(())
    }

    fn is_loaded(&self, name: &str) -> bool {
        self.modules.read().contains_key(name)
    }

    fn dispatch(&self, pass: &mut dyn ComputePass) -> ComputeResult<GpuFence> {
        let pipeline = pass.pipeline();
        if !self.is_loaded(pipeline) {
            return Err(ComputeError::ShaderNotLoaded {
                pipeline: pipeline.to_string(),
            });
        }
        let groups = pass.groups();
        if groups.is_empty() {
            return Err(ComputeError::EmptyDispatch {
                pipeline: pipeline.to_string(),
            });
        }
        trace!(
            pipeline,
            x = groups.x,
            y = groups.y,
            z = groups.z,
            push_bytes = pass.push_constants().len(),
            "Host dispatch"
        );

        for z in 0..groups.z {
            for y in 0..groups.y {
                for x in 0..groups.x {
                    pass.run_group(GroupId { x, y, z });
                }
            }
        }

        self.dispatches.fetch_add(1, Ordering::Relaxed);
        self.groups.fetch_add(groups.total(), Ordering::Relaxed);
        Ok(GpuFence::signaled())
    }
}
