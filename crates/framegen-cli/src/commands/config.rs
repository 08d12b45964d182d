//! Configuration file commands

use std::path::Path;

use anyhow::Result;
use framegen_engine::{load_config, to_yaml};

use crate::commands::ConfigCommands;
use crate::error::CliError;

/// Execute a config subcommand
pub fn execute(cmd: &ConfigCommands, json: bool) -> Result<()> {
    match cmd {
        ConfigCommands::Default => print_default(json),
        ConfigCommands::Check { path } => check(path, json),
    }
}

fn print_default(json: bool) -> Result<()> {
    let config = framegen_core::EngineConfig::default();
    if json {
        println!("{}", serde_json::to_string_pretty(&config).map_err(CliError::from)?);
    } else {
        print!("{}", to_yaml(&config).map_err(CliError::from)?);
    }
    Ok(())
}

fn check(path: &Path, json: bool) -> Result<()> {
    let config = load_config(path).map_err(CliError::from)?;
    if json {
        let output = serde_json::json!({
            "success": true,
            "path": path.display().to_string(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{}: ok ({}x{}, mode {}, {} Hz)",
            path.display(),
            config.width,
            config.height,
            config.mode,
            config.target_refresh_rate
        );
    }
    Ok(())
}
