//! Thermal sensors.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use framegen_core::ThermalSensor;
use tracing::{debug, info};

const FIXED_ZONES: [&str; 4] = [
    "sys/class/thermal/thermal_zone0/temp",
    "sys/class/thermal/thermal_zone1/temp",
    "sys/class/thermal/thermal_zone3/temp",
    "sys/devices/virtual/thermal/thermal_zone0/temp",
];

const ZONE_DIR: &str = "sys/class/thermal";

/// Parse a sysfs temperature.
///
/// Values above 1000 are millidegrees. Zero, negative and unparsable
/// readings mean "no reading".
#[must_use]
pub fn parse_reading(text: &str) -> Option<f32> {
    let value: f32 = text.trim().parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some(if value > 1000.0 { value / 1000.0 } else { value })
}

/// Reads a Linux thermal zone from sysfs.
#[derive(Debug, Clone, Default)]
pub struct SysfsThermalSensor {
    path: Option<PathBuf>,
}

impl SysfsThermalSensor {
    /// Detect the standard thermal zones under `/`.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_under(Path::new("/"))
    }

    /// Detect thermal zones below `root`.
    ///
    /// The fixed zone list is tried first, then any zone whose `type`
    /// names a GPU.
    #[must_use]
    pub fn detect_under(root: &Path) -> Self {
        let fixed = FIXED_ZONES.iter().map(|rel| root.join(rel));
        let path = fixed
            .chain(gpu_zones(&root.join(ZONE_DIR)))
            .find(|candidate| read_path(candidate).is_some());
        match &path {
            Some(p) => info!(path = %p.display(), "Thermal zone found"),
            None => debug!(root = %root.display(), "No readable thermal zone"),
        }
        Self { path }
    }

    /// Read a specific file.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The zone file in use.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn gpu_zones(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut zones: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|zone| {
            fs::read_to_string(zone.join("type"))
                .is_ok_and(|kind| kind.to_ascii_lowercase().contains("gpu"))
        })
        .map(|zone| zone.join("temp"))
        .collect();
    zones.sort();
    zones
}

fn read_path(path: &Path) -> Option<f32> {
    fs::read_to_string(path).ok().as_deref().and_then(parse_reading)
}

impl ThermalSensor for SysfsThermalSensor {
    fn read_celsius(&self) -> Option<f32> {
        self.path.as_deref().and_then(read_path)
    }
}

/// Sensor with a settable reading, for simulation.
#[derive(Debug)]
pub struct StaticThermalSensor {
    bits: AtomicU32,
    known: AtomicBool,
}

impl StaticThermalSensor {
    /// Sensor reporting `celsius`.
    #[must_use]
    pub fn new(celsius: f32) -> Self {
        Self {
            bits: AtomicU32::new(celsius.to_bits()),
            known: AtomicBool::new(true),
        }
    }

    /// Sensor with no reading.
    #[must_use]
    pub fn unknown() -> Self {
        let sensor = Self::new(0.0);
        sensor.known.store(false, Ordering::Relaxed);
        sensor
    }

    /// Change the reading.
    pub fn set(&self, celsius: f32) {
        self.bits.store(celsius.to_bits(), Ordering::Relaxed);
        self.known.store(true, Ordering::Relaxed);
    }

    /// Drop the reading.
    pub fn clear(&self) {
        self.known.store(false, Ordering::Relaxed);
    }
}

impl ThermalSensor for StaticThermalSensor {
    fn read_celsius(&self) -> Option<f32> {
        self.known
            .load(Ordering::Relaxed)
            .then(|| f32::from_bits(self.bits.load(Ordering::Relaxed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_millidegrees() {
        assert_eq!(parse_reading("45000\n"), Some(45.0));
        assert_eq!(parse_reading("62"), Some(62.0));
    }

    #[test]
    fn test_parse_rejects_non_positive() {
        assert_eq!(parse_reading("0"), None);
        assert_eq!(parse_reading("-5000"), None);
        assert_eq!(parse_reading("hot"), None);
    }

    #[test]
    fn test_static_sensor() {
        let sensor = StaticThermalSensor::unknown();
        assert_eq!(sensor.read_celsius(), None);
        sensor.set(80.0);
        assert_eq!(sensor.read_celsius(), Some(80.0));
        sensor.clear();
        assert_eq!(sensor.read_celsius(), None);
    }
}
