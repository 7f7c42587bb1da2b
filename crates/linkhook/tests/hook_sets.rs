use std::sync::atomic::{AtomicUsize, Ordering};

use linkhook::alloc::{slot, ObserveAllocFn, ObserveFreeFn};
use linkhook::logging::{self, FormatEntryFn, TimestampFn};
use linkhook::{
    AllocHooks, DefaultLogHooks, Hook, InstrumentedAllocator, LogHooks, Logger, NoTracking,
    Resolution,
};

static ALLOCS: AtomicUsize = AtomicUsize::new(0);
static FREES: AtomicUsize = AtomicUsize::new(0);
static BYTES: AtomicUsize = AtomicUsize::new(0);

fn count_alloc(_address: usize, size: usize) {
    ALLOCS.fetch_add(1, Ordering::SeqCst);
    BYTES.fetch_add(size, Ordering::SeqCst);
}

fn count_free(_address: usize) {
    FREES.fetch_add(1, Ordering::SeqCst);
}

struct Counting;

impl AllocHooks for Counting {
    const OBSERVE_ALLOC: Hook<ObserveAllocFn> = slot::OBSERVE_ALLOC.with_override(count_alloc);
    const OBSERVE_FREE: Hook<ObserveFreeFn> = slot::OBSERVE_FREE.with_override(count_free);
}

fn frozen_timestamp() -> String {
    "2000-01-01 00:00:00".to_string()
}

fn shouting_format(timestamp: &str, level: &str, message: &str) -> String {
    format!("{timestamp} {level} {}", message.to_uppercase())
}

struct FrozenClock;

impl LogHooks for FrozenClock {
    const TIMESTAMP: Hook<TimestampFn> = logging::slot::TIMESTAMP.with_override(frozen_timestamp);
}

struct Shouting;

impl LogHooks for Shouting {
    const TIMESTAMP: Hook<TimestampFn> = logging::slot::TIMESTAMP.with_override(frozen_timestamp);
    const FORMAT_ENTRY: Hook<FormatEntryFn> =
        logging::slot::FORMAT_ENTRY.with_override(shouting_format);
}

#[test]
fn test_partial_override_keeps_other_defaults() {
    let wiring = FrozenClock::wiring();
    assert_eq!(wiring[0].name, "log.timestamp");
    assert_eq!(wiring[0].resolution, Resolution::Override);
    assert_eq!(wiring[1].name, "log.format_entry");
    assert_eq!(wiring[1].resolution, Resolution::Default);

    let entry = Logger::<FrozenClock>::new().entry("INFO", "Application started");
    assert_eq!(entry.line, "[2000-01-01 00:00:00] INFO: Application started");
}

#[test]
fn test_full_override_replaces_the_line() {
    let entry = Logger::<Shouting>::new().entry("WARN", "disk almost full");
    assert_eq!(entry.line, "2000-01-01 00:00:00 WARN DISK ALMOST FULL");
    assert_eq!(entry.level, "WARN");
    assert_eq!(entry.message, "disk almost full");
}

#[test]
fn test_default_logger_writes_one_line_per_entry() {
    let logger = Logger::<DefaultLogHooks>::new();
    let mut out = Vec::new();
    logger.emit_to(&mut out, "INFO", "first").unwrap();
    logger.emit_to(&mut out, "ERROR", "second").unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("] INFO: first"));
    assert!(lines[1].ends_with("] ERROR: second"));
}

#[test]
fn test_counting_allocator_sees_every_block() {
    let allocator = InstrumentedAllocator::<Counting>::new();

    let blocks: Vec<_> = [8usize, 16, 0]
        .into_iter()
        .map(|size| allocator.tracked_alloc(size).unwrap())
        .collect();
    assert_eq!(ALLOCS.load(Ordering::SeqCst), 3);
    assert_eq!(BYTES.load(Ordering::SeqCst), 24);

    for block in blocks {
        allocator.tracked_free(block);
    }
    assert_eq!(FREES.load(Ordering::SeqCst), 3);
}

#[test]
fn test_no_tracking_passes_through() {
    assert!(NoTracking::wiring()
        .iter()
        .all(|info| info.resolution == Resolution::Absent));

    let allocator = InstrumentedAllocator::<NoTracking>::new();
    let block = allocator.tracked_alloc(32).unwrap();
    unsafe { block.as_ptr().write_bytes(0xab, block.size()) };
    allocator.tracked_free(block);
}

#[test]
#[should_panic(expected = "alloc.report")]
fn test_invoking_an_absent_slot_panics() {
    NoTracking::REPORT.resolve()();
}
