use linkhook::{tracked_alloc, tracked_free, LedgerHooks};

#[linkhook::main(format = "json", trace = "off")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _kept = tracked_alloc::<LedgerHooks>(64)?;
    let dropped = tracked_alloc::<LedgerHooks>(256)?;
    tracked_free::<LedgerHooks>(dropped);

    Ok(())
}
