#![cfg(all(feature = "global-tracking", not(feature = "tracking-off")))]

use std::sync::{Arc, Mutex};

use linkhook::{is_active, LedgerGuardBuilder, Reporter, SessionReport, Trace};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<SessionReport>>>);

impl Reporter for Capture {
    fn report(&self, session: &SessionReport) -> Result<(), Box<dyn std::error::Error>> {
        self.0.lock().unwrap().push(session.clone());
        Ok(())
    }
}

// The global allocator sees every allocation in the process, so the test
// harness may add records of its own. Assertions only look at blocks this
// test owns.
#[test]
fn test_global_allocator_feeds_the_ledger() {
    let capture = Capture::default();
    let guard = LedgerGuardBuilder::new("global")
        .trace(Trace::Off)
        .reporter(Box::new(capture.clone()))
        .build();
    assert!(is_active());

    // Several allocations in a row: each one grows the ledger's own map
    // while its lock is held.
    let scratch: Vec<Vec<u8>> = (1..=8).map(|i| vec![0u8; 512 * i]).collect();
    let scratch_blocks: Vec<(usize, u64)> = scratch
        .iter()
        .map(|v| (v.as_ptr() as usize, v.len() as u64))
        .collect();

    let during = guard.snapshot();
    for (address, size) in &scratch_blocks {
        assert!(
            during
                .leaks
                .iter()
                .any(|leak| leak.address == *address && leak.size == *size),
            "block of {size} bytes at {address:#x} not recorded"
        );
    }
    assert!(during.totals.total_allocated >= (1..=8).map(|i| 512 * i).sum::<u64>());

    drop(scratch);

    let freed = guard.snapshot();
    assert!(freed
        .leaks
        .iter()
        .all(|leak| !scratch_blocks.contains(&(leak.address, leak.size))));
    assert!(freed.totals.total_freed >= scratch_blocks.iter().map(|(_, size)| size).sum::<u64>());

    let leaked: &'static mut [u8] = Box::leak(vec![7u8; 1024].into_boxed_slice());
    let leaked_address = leaked.as_ptr() as usize;

    let after = guard.snapshot();
    assert!(after
        .leaks
        .iter()
        .any(|leak| leak.address == leaked_address && leak.size == 1024));
    assert_eq!(
        after.totals.current_usage,
        after.totals.total_allocated - after.totals.total_freed
    );
    assert!(after.totals.peak_usage >= after.totals.current_usage);

    drop(guard);
    assert!(!is_active());

    let sessions = capture.0.lock().unwrap().clone();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0]
        .ledger
        .leaks
        .iter()
        .any(|leak| leak.address == leaked_address && leak.size == 1024));
}
