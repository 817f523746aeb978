//! Structured logging setup with tracing

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking writer flushing for the process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Install the tracing subscriber: env-filtered, JSON rolling file, plus a
/// pretty console layer in debug builds.
pub fn init_logging() -> anyhow::Result<()> {
    let dir = super::log_dir();
    std::fs::create_dir_all(&dir)?;

    let (file_writer, guard) = tracing_appender::non_blocking(RollingFileAppender::new(
        Rotation::DAILY,
        &dir,
        "lumenbox.log",
    ));
    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer().json().with_writer(file_writer);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if cfg!(debug_assertions) {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry.init();
    }

    tracing::info!(dir = %dir.display(), "Logging initialized");
    Ok(())
}

/// Delete `.log` files in the log directory older than `days`. Returns the
/// number removed.
pub fn cleanup_old_logs(days: u32) -> anyhow::Result<usize> {
    use std::time::{Duration, SystemTime};

    let dir = super::log_dir();
    if !dir.exists() {
        return Ok(0);
    }
    let cutoff = SystemTime::now() - Duration::from_secs(u64::from(days) * 86_400);

    let mut removed = 0;
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().map_or(true, |ext| ext != "log") {
            continue;
        }
        let stale = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(|modified| modified < cutoff)
            .unwrap_or(false);
        if stale && std::fs::remove_file(&path).is_ok() {
            tracing::debug!(path = %path.display(), "Removed stale log");
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::info!(removed, "Log cleanup done");
    }
    Ok(removed)
}
