//! Hook-driven logging: a timestamp hook and a formatter hook turn
//! `(level, message)` into one output line.
//!
//! ```rust
//! use linkhook::logging::{slot, unix_micros_timestamp, TimestampFn};
//! use linkhook::{Hook, LogHooks, Logger};
//!
//! struct EpochTimes;
//! impl LogHooks for EpochTimes {
//!     const TIMESTAMP: Hook<TimestampFn> = slot::TIMESTAMP.with_override(unix_micros_timestamp);
//! }
//!
//! let mut out = Vec::new();
//! Logger::<EpochTimes>::new().emit_to(&mut out, "INFO", "started").unwrap();
//! assert!(String::from_utf8(out).unwrap().ends_with("] INFO: started\n"));
//! ```

use colored::*;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::hooks::{Hook, HookInfo};

pub type TimestampFn = fn() -> String;
pub type FormatEntryFn = fn(&str, &str, &str) -> String;

/// `strftime`-style pattern of [`default_timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub mod slot {
    use super::*;

    pub const TIMESTAMP: Hook<TimestampFn> = Hook::new("log.timestamp", default_timestamp);
    pub const FORMAT_ENTRY: Hook<FormatEntryFn> =
        Hook::new("log.format_entry", default_format_entry);
}

/// Local date-time, e.g. `2024-05-01 13:37:00`.
pub fn default_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `[timestamp] level: message`
pub fn default_format_entry(timestamp: &str, level: &str, message: &str) -> String {
    format!("[{timestamp}] {level}: {message}")
}

/// Seconds and microseconds since the Unix epoch, e.g. `1714570620.123456`.
pub fn unix_micros_timestamp() -> String {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", since_epoch.as_secs(), since_epoch.subsec_micros())
}

/// Level padded to five columns, coloured by severity: ERROR red, WARN
/// yellow, INFO green. Other levels are left uncoloured.
pub fn colored_format_entry(timestamp: &str, level: &str, message: &str) -> String {
    let line = format!("[{timestamp}] {level:<5}: {message}");
    match level {
        "ERROR" => line.red().to_string(),
        "WARN" => line.yellow().to_string(),
        "INFO" => line.green().to_string(),
        _ => line,
    }
}

/// Hook set consulted by [`Logger`].
pub trait LogHooks {
    const TIMESTAMP: Hook<TimestampFn> = slot::TIMESTAMP;
    const FORMAT_ENTRY: Hook<FormatEntryFn> = slot::FORMAT_ENTRY;

    fn wiring() -> Vec<HookInfo> {
        vec![
            HookInfo::of(&Self::TIMESTAMP),
            HookInfo::of(&Self::FORMAT_ENTRY),
        ]
    }
}

/// Built-in timestamp and formatter.
pub struct DefaultLogHooks;

impl LogHooks for DefaultLogHooks {}

/// One emitted entry. Not retained after emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
    pub timestamp: String,
    pub line: String,
}

pub struct Logger<H = DefaultLogHooks> {
    _hooks: PhantomData<fn() -> H>,
}

impl<H: LogHooks> Default for Logger<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: LogHooks> Logger<H> {
    pub const fn new() -> Self {
        Self {
            _hooks: PhantomData,
        }
    }

    /// Runs the timestamp hook, then the formatter hook.
    pub fn entry(&self, level: &str, message: &str) -> LogEntry {
        let timestamp = H::TIMESTAMP.resolve()();
        let line = H::FORMAT_ENTRY.resolve()(&timestamp, level, message);

        LogEntry {
            level: level.to_string(),
            message: message.to_string(),
            timestamp,
            line,
        }
    }

    pub fn emit_to<W: Write>(&self, out: &mut W, level: &str, message: &str) -> io::Result<()> {
        let entry = self.entry(level, message);
        writeln!(out, "{}", entry.line)
    }

    /// Writes the formatted line to stdout.
    pub fn emit(&self, level: &str, message: &str) {
        println!("{}", self.entry(level, message).line);
    }
}

/// Emits through the built-in hooks.
pub fn log_message(level: &str, message: &str) {
    Logger::<DefaultLogHooks>::new().emit(level, message);
}
