use std::cell::Cell;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::alloc::{slot, AllocHooks, InitFn, ObserveAllocFn, ObserveFreeFn, ReportFn};
use crate::hooks::Hook;
use crate::ledger::{LedgerReport, SharedLedger};
use crate::output::{emit_trace, Trace};

static LEDGER: SharedLedger = SharedLedger::new();

/// Observations are dropped unless a guard is alive.
static ACTIVE: AtomicBool = AtomicBool::new(false);

static TRACE: AtomicU8 = AtomicU8::new(Trace::Stdout as u8);

thread_local! {
    // Set while this thread is inside the ledger. Allocations made by the
    // ledger's own bookkeeping (and by trace output) are not observed.
    static SUSPENDED: Cell<bool> = const { Cell::new(false) };
}

struct Suspension;

impl Suspension {
    /// `None` when the thread is already inside the ledger or its
    /// thread-locals are being torn down.
    fn enter() -> Option<Self> {
        // Only the outermost entry may build a Suspension: dropping a nested
        // one would clear the flag while the outer call still holds the lock.
        let entered = SUSPENDED
            .try_with(|suspended| !suspended.replace(true))
            .unwrap_or(false);
        if entered {
            Some(Suspension)
        } else {
            None
        }
    }
}

impl Drop for Suspension {
    fn drop(&mut self) {
        let _ = SUSPENDED.try_with(|suspended| suspended.set(false));
    }
}

fn ledger_init() {
    let _suspended = Suspension::enter();
    LEDGER.init();
}

fn ledger_observe_alloc(address: usize, size: usize) {
    if !ACTIVE.load(Ordering::Acquire) {
        return;
    }
    let Some(_suspended) = Suspension::enter() else {
        return;
    };

    if let Some(event) = LEDGER.observe_alloc(address, size) {
        emit_trace(current_trace(), &event);
    }
}

fn ledger_observe_free(address: usize) {
    if !ACTIVE.load(Ordering::Acquire) {
        return;
    }
    let Some(_suspended) = Suspension::enter() else {
        return;
    };

    if let Some(event) = LEDGER.observe_free(address) {
        emit_trace(current_trace(), &event);
    }
}

fn ledger_report() {
    let _ = write_ledger_report(&mut std::io::stdout().lock());
}

fn write_ledger_report<W: Write>(out: &mut W) -> io::Result<()> {
    let _suspended = Suspension::enter();
    writeln!(out, "{}", LEDGER.report())
}

/// Hook set wired to the process-wide ledger.
///
/// Every slot is overridden. Observations are recorded only while a
/// [`LedgerGuard`](crate::LedgerGuard) is alive.
pub struct LedgerHooks;

impl AllocHooks for LedgerHooks {
    const INIT: Hook<InitFn> = slot::INIT.with_override(ledger_init);
    const OBSERVE_ALLOC: Hook<ObserveAllocFn> = slot::OBSERVE_ALLOC.with_override(ledger_observe_alloc);
    const OBSERVE_FREE: Hook<ObserveFreeFn> = slot::OBSERVE_FREE.with_override(ledger_observe_free);
    const REPORT: Hook<ReportFn> = slot::REPORT.with_override(ledger_report);
}

fn current_trace() -> Trace {
    Trace::from_u8(TRACE.load(Ordering::Relaxed))
}

pub(crate) fn activate(trace: Trace) {
    TRACE.store(trace as u8, Ordering::Relaxed);
    ACTIVE.store(true, Ordering::Release);
}

pub(crate) fn deactivate() {
    ACTIVE.store(false, Ordering::Release);
}

/// Whether the process-wide ledger is currently recording.
pub fn is_active() -> bool {
    ACTIVE.load(Ordering::Acquire)
}

/// Current state of the process-wide ledger.
pub fn snapshot() -> LedgerReport {
    let _suspended = Suspension::enter();
    LEDGER.report()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspension_is_not_reentrant() {
        let outer = Suspension::enter();
        assert!(outer.is_some());
        assert!(Suspension::enter().is_none());
        // A refused nested entry must leave the outer suspension in place.
        assert!(Suspension::enter().is_none());
        assert!(SUSPENDED.with(Cell::get));
        drop(outer);
        assert!(!SUSPENDED.with(Cell::get));
        assert!(Suspension::enter().is_some());
    }

    #[test]
    fn test_every_slot_is_overridden() {
        use crate::hooks::Resolution;

        assert!(LedgerHooks::wiring()
            .iter()
            .all(|info| info.resolution == Resolution::Override));
    }

    #[test]
    fn test_report_hook_prints_the_shared_ledger() {
        assert!(LedgerHooks::REPORT.is_present());

        LEDGER.init();
        LEDGER.observe_alloc(0x1000, 100);
        LEDGER.observe_alloc(0x2000, 50);
        LEDGER.observe_free(0x1000);

        let mut out = Vec::new();
        write_ledger_report(&mut out).unwrap();
        LEDGER.init();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("=== Memory Report ==="));
        assert!(text.contains("Current usage: 50 bytes"));
        assert!(text.ends_with("  0x2000: 50 bytes\n"));
    }
}
