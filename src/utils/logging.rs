//! Logger bootstrap plus conditional logging macros gated on a module-level
//! `ENABLE_LOGS` flag.
//!
//! Usage:
//! ```ignore
//! // In your module, define the flag first:
//! const ENABLE_LOGS: bool = true;
//!
//! // Then use the macros (they're exported at the crate root):
//! use crate::{log_info, log_warn};
//!
//! log_info!("location fix acquired");
//! ```

use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

/// Initialise `env_logger` once per process.
///
/// Reads `RUST_LOG`; falls back to `info` when unset. Safe to call from every
/// entry point, later calls are no-ops.
pub fn init_logging() {
    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(log::LevelFilter::Info);
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }
        // A host may already have installed a logger; keep theirs.
        let _ = builder.try_init();
    });
}

/// Conditional debug logging. Requires `const ENABLE_LOGS: bool` in scope.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Conditional info logging. Requires `const ENABLE_LOGS: bool` in scope.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Conditional warn logging. Requires `const ENABLE_LOGS: bool` in scope.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Conditional error logging. Requires `const ENABLE_LOGS: bool` in scope.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
