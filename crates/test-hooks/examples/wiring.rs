use linkhook::alloc::{slot, ObserveAllocFn};
use linkhook::logging::{self, unix_micros_timestamp, TimestampFn};
use linkhook::{print_wiring, AllocHooks, DefaultLogHooks, Hook, LedgerHooks, LogHooks, NoTracking};

struct MicrosLogHooks;

impl LogHooks for MicrosLogHooks {
    const TIMESTAMP: Hook<TimestampFn> = logging::slot::TIMESTAMP.with_override(unix_micros_timestamp);
}

struct CountOnly;

fn count_alloc(_address: usize, _size: usize) {}

impl AllocHooks for CountOnly {
    const OBSERVE_ALLOC: Hook<ObserveAllocFn> = slot::OBSERVE_ALLOC.with_override(count_alloc);
}

fn main() {
    print_wiring("default log hooks", &DefaultLogHooks::wiring());
    print_wiring("micros log hooks", &MicrosLogHooks::wiring());
    print_wiring("no tracking", &NoTracking::wiring());
    print_wiring("count only", &CountOnly::wiring());
    print_wiring("ledger", &LedgerHooks::wiring());

    if CountOnly::REPORT.is_present() {
        CountOnly::REPORT.resolve()();
    } else {
        println!("Optional function {} is not available", CountOnly::REPORT.name());
    }
}
