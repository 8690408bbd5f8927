//! Logging setup utilities for the focus room service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the server library crates and the binary log at `default_log_level`
/// unless `RUST_LOG` overrides the filter.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "focusroom_server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use focusroom_shared::logger::setup_logger;
///
/// setup_logger("focusroom_server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let binary_target = binary_name.replace('-', "_");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "focusroom_server={level},focusroom_shared={level},{binary_target}={level},tower_http={level}",
                    level = default_log_level,
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
