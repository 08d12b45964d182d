//! Command implementations for the framegen CLI

pub mod config;
pub mod info;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Subcommand};
use framegen_core::InterpolationMode;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration file (YAML, or JSON by extension)
    #[arg(short, long, env = "FRAMEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Frame width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Output multiplier: off, 2x, 3x or 4x
    #[arg(short, long, env = "FRAMEGEN_MODE")]
    pub mode: Option<InterpolationMode>,

    /// Quality knob in [0, 1]
    #[arg(short, long)]
    pub quality: Option<f32>,

    /// Display refresh rate in Hz; the frame budget is one interval
    #[arg(short, long, env = "FRAMEGEN_RATE")]
    pub rate: Option<u32>,

    /// Synthetic source frame rate in Hz
    #[arg(long, default_value_t = 30)]
    pub source_fps: u32,

    /// Run time in seconds
    #[arg(short, long, default_value_t = 3.0)]
    pub duration: f64,

    /// Stop after this many source frames, even before the duration ends
    #[arg(long)]
    pub frames: Option<u64>,

    /// Pixels the synthetic scene moves per frame
    #[arg(long, default_value_t = 2)]
    pub speed: u32,

    /// Simulated GPU temperature in Celsius instead of reading sysfs
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Disable thermal protection
    #[arg(long)]
    pub no_thermal: bool,

    /// Directory with `<pipeline>.spv` shader modules
    #[arg(long, env = "FRAMEGEN_SHADER_DIR")]
    pub shader_dir: Option<PathBuf>,

    /// Print the performance overlay once per second
    #[arg(long)]
    pub overlay: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the default configuration as YAML
    Default,

    /// Validate a configuration file
    Check {
        /// Path to the file
        path: PathBuf,
    },
}
