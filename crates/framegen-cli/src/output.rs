//! Output formatting for CLI responses

use anyhow::{Error, Result};
use serde_json::json;

use crate::commands::run::RunSummary;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "chain": error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("Error: {error}");
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}

/// Print the result of a demo run
pub fn print_run_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        let output = json!({ "success": true, "run": summary });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let stats = &summary.stats;
    println!(
        "Ran {} at {}x{} for {:.2} s ({} strategy, {} Hz display)",
        summary.mode, summary.width, summary.height, summary.seconds, summary.strategy, summary.refresh_rate
    );
    println!("  Captured:   {}", summary.captured);
    println!(
        "  Presented:  {} ({} synthetic)",
        summary.presented, summary.presented_synthetic
    );
    println!("  Generated:  {}", stats.frames_generated);
    println!("  Dropped:    {}", stats.frames_dropped);
    println!("  Output:     {:.1} fps", stats.effective_fps);
    println!(
        "  Stages:     capture {:.2} ms, motion {:.2} ms, interp {:.2} ms, present {:.2} ms",
        stats.capture_ms, stats.motion_ms, stats.interpolation_ms, stats.present_ms
    );
    println!(
        "  Adaptive:   quality {:.2}, scale {:.2}{}",
        summary.quality,
        summary.model_scale,
        if summary.throttled { ", throttled" } else { "" }
    );
    if stats.gpu_temp_celsius > 0.0 {
        println!("  GPU temp:   {:.1} °C", stats.gpu_temp_celsius);
    }
    Ok(())
}
