/// Macro for prefixed status logging to stderr.
///
/// Usage:
/// ```ignore
/// log_status!("auth", "Assuming role {}", role_arn);
/// log_status!("run", "Pipeline aborted: {}", err);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
    };
}

/// Low-visibility diagnostic logging, emitted only when `TFDRIVE_DEBUG`
/// is set in the environment.
#[macro_export]
macro_rules! log_debug {
    ($prefix:expr, $($arg:tt)*) => {
        if ::std::env::var_os("TFDRIVE_DEBUG").is_some() {
            eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
        }
    };
}

pub mod command;
pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod executor;
pub mod plugin;

// Re-export common types for ergonomic library use
pub use config::{RemoteBackend, RunConfig};
pub use error::{Error, Result};
pub use plugin::Plugin;
