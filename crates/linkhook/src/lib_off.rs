//! No-op tracking, compiled in place of the ledger-backed unit when the
//! `tracking-off` feature is enabled. The public API is identical; every
//! allocation slot of [`LedgerHooks`] stays absent, so instrumented
//! allocators pass straight through and guards record nothing.

use crate::alloc::AllocHooks;
use crate::ledger::LedgerReport;
use crate::output::{Format, Reporter, Trace};

pub struct LedgerHooks;

impl AllocHooks for LedgerHooks {}

pub fn is_active() -> bool {
    false
}

pub fn snapshot() -> LedgerReport {
    LedgerReport::default()
}

pub struct LedgerGuardBuilder {}

impl LedgerGuardBuilder {
    pub fn new(_caller_name: &'static str) -> Self {
        Self {}
    }

    pub fn format(self, _format: Format) -> Self {
        self
    }

    pub fn trace(self, _trace: Trace) -> Self {
        self
    }

    pub fn reporter(self, _reporter: Box<dyn Reporter>) -> Self {
        self
    }

    pub fn build(self) -> LedgerGuard {
        LedgerGuard {}
    }
}

pub struct LedgerGuard {}

impl LedgerGuard {
    pub fn snapshot(&self) -> LedgerReport {
        LedgerReport::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Resolution;

    #[test]
    fn test_no_slot_is_wired() {
        assert!(LedgerHooks::wiring()
            .iter()
            .all(|info| info.resolution == Resolution::Absent));
    }

    #[test]
    fn test_guards_do_not_conflict() {
        let first = LedgerGuardBuilder::new("first").build();
        let second = LedgerGuardBuilder::new("second").build();
        assert_eq!(first.snapshot(), LedgerReport::default());
        assert_eq!(second.snapshot(), LedgerReport::default());
        assert!(!is_active());
    }
}
