//! Logging setup shared by the pylon binaries.
mod config;
mod error;
mod filter;
mod format;
mod install;
mod timer;

pub use config::{FILTER_ENV, LoggerConfig};
pub use error::{LoggerError, LoggerResult};
pub use filter::LogFilter;
pub use format::LogFormat;
pub use timer::UtcRfc3339;

/// Install the global tracing subscriber described by `cfg`.
///
/// Fails if the filter is invalid, journald is unavailable, or a subscriber is
/// already installed.
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LogFormat::Text => install::text(cfg),
        LogFormat::Json => install::json(cfg),
        LogFormat::Journald => install::journald(cfg),
    }
}
