//! Panic hook for crash reporting

use backtrace::Backtrace;
use chrono::Local;
use std::panic::PanicHookInfo;

/// Install a panic hook that logs the panic and writes a crash dump file.
pub fn init_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let report = crash_report(info);

        // stderr is always available; tracing may already be torn down
        eprintln!("{}", report);
        tracing::error!("{}", report);

        let path = std::env::temp_dir().join(format!(
            "lumenbox_crash_{}.txt",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        if let Err(e) = std::fs::write(&path, &report) {
            eprintln!("Failed to write crash dump: {}", e);
        }
    }));
    tracing::debug!("Panic hook installed");
}

fn crash_report(info: &PanicHookInfo) -> String {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<unknown>".to_string());

    format!(
        "=== PANIC ===\n\
         Timestamp: {}\n\
         Thread: {}\n\
         Location: {}\n\
         Payload: {}\n\n\
         Stack Trace:\n{:?}",
        Local::now().to_rfc3339(),
        std::thread::current().name().unwrap_or("<unnamed>"),
        info.location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "<unknown>".to_string()),
        payload,
        Backtrace::new()
    )
}
