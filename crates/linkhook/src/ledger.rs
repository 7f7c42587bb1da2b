//! Allocation ledger: live records keyed by address plus running totals.
//!
//! The ledger only observes. It never allocates or frees the memory it is
//! told about, and anomalies (null addresses, frees of unknown addresses)
//! are absorbed and surfaced as events instead of errors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-wide counters. All values are in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_allocated: u64,
    pub total_freed: u64,
    pub peak_usage: u64,
    pub current_usage: u64,
}

/// A live allocation reported as leaked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leak {
    pub address: usize,
    pub size: u64,
}

/// Trace event produced by a ledger observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEvent {
    Alloc {
        address: usize,
        size: u64,
        current: u64,
    },
    Free {
        address: usize,
        size: u64,
        current: u64,
    },
    /// Free of an address with no live record: a double free or foreign memory.
    UntrackedFree { address: usize },
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Alloc {
                address,
                size,
                current,
            } => write!(f, "ALLOC: {address:#x} [{size} bytes] (current: {current})"),
            LedgerEvent::Free {
                address,
                size,
                current,
            } => write!(f, "FREE: {address:#x} [{size} bytes] (current: {current})"),
            LedgerEvent::UntrackedFree { address } => {
                write!(f, "FREE: {address:#x} [UNKNOWN - not tracked!]")
            }
        }
    }
}

/// Snapshot of the ledger: totals plus every live record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReport {
    #[serde(flatten)]
    pub totals: LedgerTotals,
    pub leaked: u64,
    /// Most recent allocation first.
    pub leaks: Vec<Leak>,
}

impl LedgerReport {
    pub fn has_leaks(&self) -> bool {
        !self.leaks.is_empty()
    }
}

impl fmt::Display for LedgerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Memory Report ===")?;
        writeln!(f, "Total allocated: {} bytes", self.totals.total_allocated)?;
        writeln!(f, "Total freed: {} bytes", self.totals.total_freed)?;
        writeln!(f, "Peak usage: {} bytes", self.totals.peak_usage)?;
        writeln!(f, "Current usage: {} bytes", self.totals.current_usage)?;
        write!(f, "Leaked: {} bytes", self.leaked)?;

        if self.has_leaks() {
            writeln!(f)?;
            writeln!(f)?;
            write!(f, "Leaked allocations:")?;
            for leak in &self.leaks {
                writeln!(f)?;
                write!(f, "  {:#x}: {} bytes", leak.address, leak.size)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Record {
    size: u64,
    seq: u64,
}

/// Record store and running totals for one measurement window.
#[derive(Debug, Default)]
pub struct Ledger {
    // An address normally holds one record; a second allocation reported at a
    // live address stacks on top and is released first.
    records: BTreeMap<usize, Vec<Record>>,
    totals: LedgerTotals,
    next_seq: u64,
}

impl Ledger {
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            totals: LedgerTotals {
                total_allocated: 0,
                total_freed: 0,
                peak_usage: 0,
                current_usage: 0,
            },
            next_seq: 0,
        }
    }

    /// Discards all records and zeroes the counters, starting a fresh window.
    pub fn init(&mut self) {
        self.records.clear();
        self.totals = LedgerTotals::default();
        self.next_seq = 0;
    }

    /// Records a new allocation. Null addresses are ignored.
    pub fn observe_alloc(&mut self, address: usize, size: usize) -> Option<LedgerEvent> {
        if address == 0 {
            return None;
        }

        let size = size as u64;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records
            .entry(address)
            .or_default()
            .push(Record { size, seq });

        self.totals.total_allocated += size;
        self.totals.current_usage += size;
        self.totals.peak_usage = self.totals.peak_usage.max(self.totals.current_usage);

        Some(LedgerEvent::Alloc {
            address,
            size,
            current: self.totals.current_usage,
        })
    }

    /// Releases the record for `address`. Unknown addresses leave the counters
    /// untouched and yield [`LedgerEvent::UntrackedFree`].
    pub fn observe_free(&mut self, address: usize) -> Option<LedgerEvent> {
        if address == 0 {
            return None;
        }

        let Some(stack) = self.records.get_mut(&address) else {
            return Some(LedgerEvent::UntrackedFree { address });
        };
        let Some(record) = stack.pop() else {
            self.records.remove(&address);
            return Some(LedgerEvent::UntrackedFree { address });
        };
        if stack.is_empty() {
            self.records.remove(&address);
        }

        self.totals.total_freed += record.size;
        self.totals.current_usage -= record.size;

        Some(LedgerEvent::Free {
            address,
            size: record.size,
            current: self.totals.current_usage,
        })
    }

    pub fn totals(&self) -> LedgerTotals {
        self.totals
    }

    pub fn live_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Live records, most recent allocation first.
    pub fn live_records(&self) -> Vec<Leak> {
        let mut live: Vec<(u64, Leak)> = self
            .records
            .iter()
            .flat_map(|(&address, stack)| {
                stack.iter().map(move |record| {
                    (
                        record.seq,
                        Leak {
                            address,
                            size: record.size,
                        },
                    )
                })
            })
            .collect();
        live.sort_by(|a, b| b.0.cmp(&a.0));
        live.into_iter().map(|(_, leak)| leak).collect()
    }

    pub fn report(&self) -> LedgerReport {
        LedgerReport {
            totals: self.totals,
            leaked: self.totals.current_usage,
            leaks: self.live_records(),
        }
    }
}

/// A [`Ledger`] behind one mutex, usable from any thread through `&self`.
#[derive(Debug, Default)]
pub struct SharedLedger {
    inner: Mutex<Ledger>,
}

impl SharedLedger {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Ledger::new()),
        }
    }

    // Poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn init(&self) {
        self.lock().init();
    }

    pub fn observe_alloc(&self, address: usize, size: usize) -> Option<LedgerEvent> {
        self.lock().observe_alloc(address, size)
    }

    pub fn observe_free(&self, address: usize) -> Option<LedgerEvent> {
        self.lock().observe_free(address)
    }

    pub fn totals(&self) -> LedgerTotals {
        self.lock().totals()
    }

    pub fn report(&self) -> LedgerReport {
        self.lock().report()
    }
}
