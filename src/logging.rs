//! Logging setup for fabriclink
//!
//! The logging context is constructed explicitly from [`LogOptions`] rather
//! than living in hidden global state: callers decide the severity gates and
//! whether output is colored, and tests can call [`init_for_tests`] as often
//! as they like. A filter of `"off"` discards everything, the per-target
//! syntax of `tracing_subscriber::EnvFilter` gates individual severities.

use crate::error::{ClientError, Result};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// `EnvFilter` directive string, e.g. `"info"` or `"fabriclink=debug"`.
    pub filter: String,
    pub ansi: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
        }
    }
}

/// Install the process-wide subscriber. Fails on an invalid filter string
/// and when a subscriber is already installed.
pub fn init(options: &LogOptions) -> Result<()> {
    let filter = EnvFilter::try_new(&options.filter).map_err(|e| {
        ClientError::Config(format!("invalid log filter \"{}\": {}", options.filter, e))
    })?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(options.ansi)
        .try_init()
        .map_err(|e| ClientError::Config(format!("logger init failed: {}", e)))
}

/// Best-effort init for tests; an already-installed subscriber is fine.
pub fn init_for_tests() {
    let _ = init(&LogOptions {
        filter: "debug".to_string(),
        ansi: false,
    });
}
