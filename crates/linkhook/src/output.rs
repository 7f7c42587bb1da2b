use colored::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ledger::{LedgerEvent, LedgerReport};

/// Output format for the report printed when a [`LedgerGuard`](crate::LedgerGuard) drops.
///
/// # Variants
///
/// * `Text` - The plain memory report block (default)
/// * `Json` - Compact JSON format (single line)
/// * `JsonPretty` - Pretty-printed JSON format with indentation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// Where ledger trace events go while a guard is alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Trace {
    Off = 0,
    /// One text line per event on stdout.
    #[default]
    Stdout = 1,
    /// `tracing` events: `debug` for alloc/free, `warn` for untracked frees.
    Tracing = 2,
}

impl Trace {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Trace::Stdout,
            2 => Trace::Tracing,
            _ => Trace::Off,
        }
    }

    /// Reads `LINKHOOK_TRACE` (`off`, `stdout` or `tracing`).
    pub fn from_env() -> Option<Self> {
        let value = std::env::var("LINKHOOK_TRACE").ok()?;
        value.parse().ok()
    }
}

impl std::str::FromStr for Trace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "0" | "false" => Ok(Trace::Off),
            "stdout" => Ok(Trace::Stdout),
            "tracing" => Ok(Trace::Tracing),
            other => Err(format!(
                "unknown trace mode {other:?}, expected one of: off, stdout, tracing"
            )),
        }
    }
}

pub(crate) fn emit_trace(trace: Trace, event: &LedgerEvent) {
    match trace {
        Trace::Off => {}
        Trace::Stdout => println!("{event}"),
        Trace::Tracing => {
            let tid = crate::tid::current_tid();
            match *event {
                LedgerEvent::Alloc {
                    address,
                    size,
                    current,
                } => tracing::debug!(address, size, current, tid, "alloc"),
                LedgerEvent::Free {
                    address,
                    size,
                    current,
                } => tracing::debug!(address, size, current, tid, "free"),
                LedgerEvent::UntrackedFree { address } => {
                    tracing::warn!(address, tid, "free of untracked address")
                }
            }
        }
    }
}

/// Everything a [`Reporter`] gets when a guard drops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub caller_name: String,
    /// Nanoseconds the guard was alive.
    pub total_elapsed: u64,
    pub ledger: LedgerReport,
}

/// Trait for implementing custom report output.
///
/// # Examples
///
/// ```rust
/// use linkhook::{Reporter, SessionReport};
/// use std::error::Error;
///
/// struct LeakCount;
///
/// impl Reporter for LeakCount {
///     fn report(&self, session: &SessionReport) -> Result<(), Box<dyn Error>> {
///         println!("{}: {} leaks", session.caller_name, session.ledger.leaks.len());
///         Ok(())
///     }
/// }
/// ```
pub trait Reporter: Send + Sync {
    fn report(&self, session: &SessionReport) -> Result<(), Box<dyn std::error::Error>>;
}

/// Header line printed ahead of the text report block.
pub(crate) fn print_session_header(session: &SessionReport) {
    println!();
    println!(
        "{} {}: {:.2?} (peak {})",
        "[linkhook]".blue().bold(),
        session.caller_name.yellow().bold(),
        Duration::from_nanos(session.total_elapsed),
        format_bytes(session.ledger.totals.peak_usage),
    );
}

pub(crate) struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&self, session: &SessionReport) -> Result<(), Box<dyn std::error::Error>> {
        println!("{}", serde_json::to_string(session)?);
        Ok(())
    }
}

pub(crate) struct JsonPrettyReporter;

impl Reporter for JsonPrettyReporter {
    fn report(&self, session: &SessionReport) -> Result<(), Box<dyn std::error::Error>> {
        println!("{}", serde_json::to_string_pretty(session)?);
        Ok(())
    }
}

impl Format {
    /// `None` for [`Format::Text`]: the text block is printed by the
    /// allocation report hook.
    pub(crate) fn reporter(self) -> Option<Box<dyn Reporter>> {
        match self {
            Format::Text => None,
            Format::Json => Some(Box::new(JsonReporter)),
            Format::JsonPretty => Some(Box::new(JsonPrettyReporter)),
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log(THRESHOLD).floor() as usize).min(UNITS.len() - 1);
    let unit_value = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", unit_value, UNITS[unit_index])
    }
}
