//! Logging setup for applications embedding the patch residuals.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the host.

use tracing::Level;

/// Initialize the tracing subscriber with the default INFO level.
///
/// The level can be overridden through `RUST_LOG`.
///
/// # Example
/// ```no_run
/// use photoba::init_logger;
///
/// init_logger();
/// tracing::info!("Photometric BA started");
/// ```
///
/// # Environment Variables
/// ```bash
/// RUST_LOG=debug cargo test
/// RUST_LOG=photoba=trace cargo bench
/// ```
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a custom default level.
///
/// # Arguments
/// * `default_level` - The default log level (overrideable via RUST_LOG)
pub fn init_logger_with_level(default_level: Level) {
    use tracing_subscriber::fmt::time::SystemTime;

    // try_init: a host that already installed a subscriber keeps it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_timer(SystemTime)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
}
