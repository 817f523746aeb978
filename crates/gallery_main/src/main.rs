//! Lumenbox - Headless Media Gallery Engine
//!
//! Main entry point for the interactive demo driver.

mod app;

use anyhow::Result;

fn main() -> Result<()> {
    // Initialize logging and panic hook first
    gallery_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = gallery_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("Lumenbox starting...");

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: lumenbox <image>...");
        std::process::exit(2);
    }

    app::run(paths)
}
