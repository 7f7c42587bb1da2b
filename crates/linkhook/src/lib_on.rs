// Ledger-backed tracking: LedgerHooks overrides every allocation slot and
// routes it to one process-wide ledger, opened and closed by LedgerGuard.
mod guard;
mod tracking;

pub use guard::{LedgerGuard, LedgerGuardBuilder};
pub use tracking::{is_active, snapshot, LedgerHooks};
