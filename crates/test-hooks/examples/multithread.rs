use std::thread;

use linkhook::{tracked_alloc, tracked_free, LedgerHooks};

#[linkhook::main(trace = "off")]
fn main() -> Result<(), linkhook::Error> {
    let handles: Vec<_> = (1..=4)
        .map(|worker| {
            thread::spawn(move || -> Result<(), linkhook::Error> {
                for round in 0..100 {
                    let block = tracked_alloc::<LedgerHooks>(worker * 16 + round)?;
                    tracked_free::<LedgerHooks>(block);
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked")?;
    }

    let _leftover = tracked_alloc::<LedgerHooks>(32)?;
    Ok(())
}
