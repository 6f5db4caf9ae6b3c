//! A small, zero-dependency logging crate for the Corex base layer.
//!
//! Provides a process-wide logger with an atomically adjustable minimum
//! level, colored stderr output, and macros that capture the calling
//! module path automatically.
//!
//! # Example
//!
//! ```
//! use corex_log::{Level, info, trace};
//!
//! corex_log::set_level(Level::Trace);
//!
//! info!("arena ready, {} blocks", 1);
//! trace!("bump cursor at {}", 128);
//! ```

use std::fmt::Arguments;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log levels, ordered from most severe (`Error`) to most verbose (`Trace`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Critical failures.
    Error = 0,
    /// Potentially harmful situations.
    Warn = 1,
    /// Informational messages.
    Info = 2,
    /// Diagnostic detail.
    Debug = 3,
    /// Fine-grained tracing.
    Trace = 4,
}

impl Level {
    /// Returns the fixed-width label printed in front of each record.
    pub const fn label(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn color(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Parses a case-insensitive level name.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("error") {
            Some(Level::Error)
        } else if s.eq_ignore_ascii_case("warn") {
            Some(Level::Warn)
        } else if s.eq_ignore_ascii_case("info") {
            Some(Level::Info)
        } else if s.eq_ignore_ascii_case("debug") {
            Some(Level::Debug)
        } else if s.eq_ignore_ascii_case("trace") {
            Some(Level::Trace)
        } else {
            None
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

/// The process-wide logger. Use [`logger`] to obtain the singleton.
pub struct Logger {
    level: AtomicU8,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
        }
    }

    /// Sets the minimum level; records below it are discarded.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Returns the current minimum level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Returns whether a record at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, initializing it at [`Level::Warn`] on first use.
pub fn logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(Level::Warn))
}

/// Sets the global minimum level.
pub fn set_level(level: Level) {
    logger().set_level(level);
}

/// Writes one record to stderr. Called by the macros after the level check.
#[doc(hidden)]
pub fn __emit(level: Level, target: &str, args: Arguments) {
    const RESET: &str = "\x1b[0m";

    if !logger().enabled(level) {
        return;
    }

    let mut err = std::io::stderr().lock();
    let _ = writeln!(
        err,
        "{}[{}]{RESET} {target}: {args}",
        level.color(),
        level.label()
    );
}

/// Logs at an explicit level, capturing the caller's module path.
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {
        if $crate::logger().enabled($level) {
            $crate::__emit($level, module_path!(), format_args!($($arg)*));
        }
    };
}

/// Logs at [`Level::Error`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Error, $($arg)*) };
}

/// Logs at [`Level::Warn`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Warn, $($arg)*) };
}

/// Logs at [`Level::Info`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Info, $($arg)*) };
}

/// Logs at [`Level::Debug`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Debug, $($arg)*) };
}

/// Logs at [`Level::Trace`].
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::log!(level: $crate::Level::Trace, $($arg)*) };
}
