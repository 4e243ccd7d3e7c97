//! Logger initialization.
//!
//! Everything in the crate logs through the `log` facade; this module wires
//! it to `env_logger` once, early in `main`.

use std::sync::Once;

/// Filter applied when neither [`LoggingConfig::env_filter`] nor `RUST_LOG`
/// is set. wgpu is chatty at `info`, so its internals are held at `warn`.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "debug",
/// "umbra=debug,wgpu_core=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger. Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => builder.parse_filters(&filter),
            None => builder.parse_filters(DEFAULT_FILTER),
        };

        builder.write_style(config.write_style);

        // Another logger may already be installed (e.g. by a test harness).
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}
