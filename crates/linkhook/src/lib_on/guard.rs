use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::tracking::{self, LedgerHooks};
use crate::alloc::AllocHooks;
use crate::ledger::LedgerReport;
use crate::output::{print_session_header, Format, JsonReporter, Reporter, SessionReport, Trace};

static GUARD_ALIVE: AtomicBool = AtomicBool::new(false);

/// Builder for a [`LedgerGuard`], the scoped measurement window of the
/// process-wide allocation ledger.
///
/// Building the guard resets the ledger and starts recording; dropping it
/// stops recording and hands the final report to the configured reporter.
/// Drop runs on every exit path of the enclosing scope, including `?` returns
/// and unwinding.
///
/// # Examples
///
/// ```rust
/// # #[cfg(not(any(feature = "tracking-off", feature = "global-tracking")))]
/// # {
/// use linkhook::{tracked_alloc, tracked_free, Format, LedgerGuardBuilder, LedgerHooks, Trace};
///
/// let guard = LedgerGuardBuilder::new("doc")
///     .format(Format::Json)
///     .trace(Trace::Off)
///     .build();
///
/// let block = tracked_alloc::<LedgerHooks>(64).unwrap();
/// assert_eq!(guard.snapshot().totals.current_usage, 64);
/// tracked_free::<LedgerHooks>(block);
/// # }
/// ```
///
/// # Limitations
///
/// Only one guard can be alive at a time. Building a second one (either
/// directly or via [`main`](crate::main)) panics.
pub struct LedgerGuardBuilder {
    caller_name: &'static str,
    trace: Trace,
    reporter: ReporterConfig,
}

enum ReporterConfig {
    Format(Format),
    Custom(Box<dyn Reporter>),
    None, // Will default to Format::Text
}

impl LedgerGuardBuilder {
    /// `caller_name` identifies the measurement window in the report.
    pub fn new(caller_name: &'static str) -> Self {
        Self {
            caller_name,
            trace: Trace::default(),
            reporter: ReporterConfig::None,
        }
    }

    /// Default: [`Format::Text`].
    pub fn format(mut self, format: Format) -> Self {
        self.reporter = ReporterConfig::Format(format);
        self
    }

    /// Default: [`Trace::Stdout`]. `LINKHOOK_TRACE` takes precedence when set.
    pub fn trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    /// Overrides any format setting.
    pub fn reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = ReporterConfig::Custom(reporter);
        self
    }

    /// Resets the ledger and starts recording.
    ///
    /// # Panics
    ///
    /// Panics if another guard is already alive.
    pub fn build(self) -> LedgerGuard {
        if GUARD_ALIVE.swap(true, Ordering::AcqRel) {
            panic!("More than one linkhook guard cannot be alive at the same time.");
        }

        let trace = Trace::from_env().unwrap_or(self.trace);

        // `None` prints the text block through the allocation report hook.
        let reporter: Option<Box<dyn Reporter>> = if std::env::var("LINKHOOK_JSON")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
        {
            Some(Box::new(JsonReporter))
        } else {
            match self.reporter {
                ReporterConfig::Format(format) => format.reporter(),
                ReporterConfig::Custom(reporter) => Some(reporter),
                ReporterConfig::None => Format::Text.reporter(),
            }
        };

        // Printed before the reset so stdout's lazily allocated buffer is not
        // counted against the window.
        if trace == Trace::Stdout {
            println!("=== Memory Debugging Enabled ===");
        }

        if LedgerHooks::INIT.is_present() {
            LedgerHooks::INIT.resolve()();
        }
        tracking::activate(trace);

        LedgerGuard {
            caller_name: self.caller_name,
            reporter,
            start_time: Instant::now(),
        }
    }
}

/// Keeps the process-wide ledger recording until dropped.
pub struct LedgerGuard {
    caller_name: &'static str,
    reporter: Option<Box<dyn Reporter>>,
    start_time: Instant,
}

impl LedgerGuard {
    /// Current ledger state without ending the window.
    pub fn snapshot(&self) -> LedgerReport {
        tracking::snapshot()
    }
}

impl Drop for LedgerGuard {
    fn drop(&mut self) {
        tracking::deactivate();

        let session = SessionReport {
            caller_name: self.caller_name.to_string(),
            total_elapsed: self.start_time.elapsed().as_nanos() as u64,
            ledger: tracking::snapshot(),
        };

        match &self.reporter {
            Some(reporter) => {
                if let Err(e) = reporter.report(&session) {
                    eprintln!("Failed to report linkhook ledger: {}", e);
                }
            }
            None => {
                print_session_header(&session);
                if LedgerHooks::REPORT.is_present() {
                    LedgerHooks::REPORT.resolve()();
                }
            }
        }

        GUARD_ALIVE.store(false, Ordering::Release);
    }
}
