use linkhook::{print_wiring, tracked_alloc, tracked_free, AllocHooks, LedgerHooks};

#[linkhook::main]
fn main() -> Result<(), linkhook::Error> {
    print_wiring("alloc hooks", &LedgerHooks::wiring());

    let first = tracked_alloc::<LedgerHooks>(100)?;
    let second = tracked_alloc::<LedgerHooks>(50)?;
    let third = tracked_alloc::<LedgerHooks>(200)?;

    tracked_free::<LedgerHooks>(first);
    tracked_free::<LedgerHooks>(third);

    // A free of an address the ledger never saw.
    if LedgerHooks::OBSERVE_FREE.is_present() {
        LedgerHooks::OBSERVE_FREE.resolve()(0xdead0);
    } else {
        println!("alloc.observe_free is not wired, nothing is recorded");
    }

    // `second` is never freed and shows up as a leak.
    println!("leaking {} bytes at {:#x}", second.size(), second.address());

    Ok(())
}
