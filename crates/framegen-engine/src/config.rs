//! Shared configuration and config-file loading.
//!
//! The control plane owns a [`ConfigCell`] and every change bumps its
//! revision. Workers remember the revision they applied and take a fresh
//! copy only when it moves, once per iteration.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use framegen_core::EngineConfig;
use framegen_errors::ConfigError;
use parking_lot::RwLock;
use tracing::{debug, info};

/// Revisioned engine configuration shared between threads.
#[derive(Debug)]
pub struct ConfigCell {
    config: RwLock<EngineConfig>,
    revision: AtomicU64,
}

impl ConfigCell {
    /// Wrap a configuration at revision 0.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: RwLock::new(config),
            revision: AtomicU64::new(0),
        }
    }

    /// Copy of the current configuration.
    #[must_use]
    pub fn read(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Current revision together with a copy of the configuration.
    #[must_use]
    pub fn snapshot(&self) -> (u64, EngineConfig) {
        let config = self.config.read();
        (self.revision.load(Ordering::Acquire), config.clone())
    }

    /// The snapshot, if the revision moved past `seen`.
    #[must_use]
    pub fn newer_than(&self, seen: u64) -> Option<(u64, EngineConfig)> {
        if self.revision.load(Ordering::Acquire) == seen {
            return None;
        }
        Some(self.snapshot())
    }

    /// Current revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Mutate the configuration and publish a new revision.
    ///
    /// The revision is bumped while the write lock is held, so a reader never
    /// sees a new revision paired with the old values.
    pub fn update(&self, f: impl FnOnce(&mut EngineConfig)) -> u64 {
        let mut config = self.config.write();
        f(&mut config);
        config.normalize();
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(revision, "Configuration updated");
        revision
    }
}

/// Parse a YAML configuration document; missing fields take defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed input and
/// [`ConfigError::Validation`] if a value is unusable after clamping.
pub fn from_yaml_str(text: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig =
        serde_yaml::from_str(text).map_err(|e| ConfigError::parse(e.to_string()))?;
    finish(config)
}

/// Parse a JSON configuration document; missing fields take defaults.
///
/// # Errors
///
/// Same as [`from_yaml_str`].
pub fn from_json_str(text: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig =
        serde_json::from_str(text).map_err(|e| ConfigError::parse(e.to_string()))?;
    finish(config)
}

/// Load a configuration file. `.json` files are read as JSON, anything else
/// as YAML.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
/// [`from_yaml_str`].
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        from_json_str(&text)?
    } else {
        from_yaml_str(&text)?
    };
    info!(path = %path.display(), mode = %config.mode, "Loaded configuration");
    Ok(config)
}

/// Render a configuration as YAML.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if serialization fails.
pub fn to_yaml(config: &EngineConfig) -> Result<String, ConfigError> {
    serde_yaml::to_string(config).map_err(|e| ConfigError::parse(e.to_string()))
}

fn finish(mut config: EngineConfig) -> Result<EngineConfig, ConfigError> {
    config.normalize();
    config.validate()?;
    Ok(config)
}
