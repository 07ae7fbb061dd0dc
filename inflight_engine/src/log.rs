//! Engine-side logging for the frame pipeline and its backends
//!
//! Every message carries a severity and a source tag such as
//! `"inflight::FrameProcessor"`. Errors also carry the file and line that
//! raised them. The active sink is swapped through `Engine::set_logger`.

use chrono::{DateTime, Local};
use colored::*;
use std::time::SystemTime;

/// Sink for engine log entries
///
/// ```no_run
/// use inflight_engine::inflight::log::{Logger, LogEntry};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{:?} {}", entry.severity, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// e.g. "inflight::FrameProcessor", "inflight::vulkan"
    pub source: String,
    pub message: String,
    /// Set by `inflight_error!` and the error-building macros
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

/// Ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    Warn,
    /// Carries file:line details
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the default logger
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Prints `[timestamp] [SEVERITY] [source] message` to stdout, with
/// ` (file:line)` appended when the entry has a location
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render an entry without colors (what the console line contains, minus escapes)
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, entry.severity.label(), entry.source, entry.message, file, line
            ),
            _ => format!(
                "[{}] [{}] [{}] {}",
                timestamp, entry.severity.label(), entry.source, entry.message
            ),
        }
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let label = entry.severity.label();
        let severity_str = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };

        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            );
        } else {
            println!("[{}] [{}] [{}] {}", timestamp, severity_str, source, entry.message);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```no_run
/// inflight_engine::inflight_trace!("inflight::FrameProcessor", "slot {} waiting", 0);
/// ```
#[macro_export]
macro_rules! inflight_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::inflight::Engine::log(
            $crate::inflight::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! inflight_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::inflight::Engine::log(
            $crate::inflight::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! inflight_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::inflight::Engine::log(
            $crate::inflight::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! inflight_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::inflight::Engine::log(
            $crate::inflight::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! inflight_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::inflight::Engine::log_detailed(
            $crate::inflight::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and build an `Error::BackendError` with the same message
///
/// ```no_run
/// use inflight_engine::inflight_err;
/// let err = inflight_err!("inflight::vulkan", "vkQueueSubmit failed: {}", -4);
/// ```
#[macro_export]
macro_rules! inflight_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::inflight::Engine::log_detailed(
            $crate::inflight::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::inflight::Error::BackendError(message)
    }};
}

/// Log an ERROR and return early with an `Error::BackendError`
#[macro_export]
macro_rules! inflight_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::inflight_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
