//! Lumenbox Logging & Observability Module
//!
//! Structured logging, crash reporting, and (in debug builds) a background
//! deadlock watcher for `parking_lot` locks.

mod logging;
mod panic_hook;

pub use logging::{cleanup_old_logs, init_logging};
pub use panic_hook::init_panic_hook;

use directories::ProjectDirs;
use std::path::PathBuf;

/// Directory log files are written to
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("io", "Lumenbox", "Lumenbox")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize all observability features
pub fn init() -> anyhow::Result<()> {
    init_logging()?;
    init_panic_hook();

    #[cfg(debug_assertions)]
    spawn_deadlock_watcher();

    Ok(())
}

#[cfg(debug_assertions)]
fn spawn_deadlock_watcher() {
    std::thread::spawn(|| loop {
        std::thread::sleep(std::time::Duration::from_secs(10));
        for (i, threads) in parking_lot::deadlock::check_deadlock().iter().enumerate() {
            tracing::error!(deadlock = i, "Deadlock detected");
            for t in threads {
                tracing::error!(thread = ?t.thread_id(), backtrace = ?t.backtrace());
            }
        }
    });
}
