//! Extension points that are resolved once, when the program is composed, plus
//! an allocation ledger that plugs into them.
//!
//! - [`Hook`] slots carry a built-in default and an optional override. Hook
//!   sets ([`LogHooks`], [`AllocHooks`]) are traits with associated consts, so
//!   the chosen implementation is fixed at compile time and costs a direct call.
//! - [`InstrumentedAllocator`] reports every allocation and free to the
//!   allocation slots, when they are wired.
//! - [`LedgerHooks`] wires those slots to a process-wide [`Ledger`] that a
//!   [`LedgerGuard`] opens and reports on drop: totals, peak usage and leaks.
//! - [`Logger`] formats `(level, message)` through a timestamp hook and a
//!   formatter hook.
//!
//! ## Features
//!
//! - `global-tracking` installs `InstrumentedAllocator<LedgerHooks>` as the
//!   `#[global_allocator]`.
//! - `tracking-off` swaps in a no-op [`LedgerHooks`] with no wired slots.

#[cfg(not(feature = "tracking-off"))]
#[doc(inline)]
pub use lib_on::*;
#[cfg(not(feature = "tracking-off"))]
mod lib_on;

// With tracking-off the ledger-backed unit is replaced by one whose hooks are all absent
#[cfg(feature = "tracking-off")]
#[doc(inline)]
pub use lib_off::*;
#[cfg(feature = "tracking-off")]
mod lib_off;

pub mod alloc;
mod error;
pub mod hooks;
pub mod ledger;
pub mod logging;
#[allow(dead_code)]
pub(crate) mod output;
#[allow(dead_code)]
pub(crate) mod tid;

pub use alloc::{tracked_alloc, tracked_free, AllocHooks, Block, InstrumentedAllocator, NoTracking};
pub use error::{Error, Result};
pub use hooks::{print_wiring, Hook, HookInfo, Resolution};
pub use ledger::{Leak, Ledger, LedgerEvent, LedgerReport, LedgerTotals, SharedLedger};
pub use linkhook_macros::main;
pub use logging::{log_message, DefaultLogHooks, LogEntry, LogHooks, Logger};
pub use output::{format_bytes, Format, Reporter, SessionReport, Trace};

#[cfg(feature = "global-tracking")]
#[global_allocator]
static GLOBAL: InstrumentedAllocator<LedgerHooks> = InstrumentedAllocator::new();
