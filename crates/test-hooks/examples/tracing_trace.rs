use linkhook::{tracked_alloc, tracked_free, AllocHooks, LedgerHooks};

#[linkhook::main(trace = "tracing")]
fn main() -> Result<(), linkhook::Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stdout)
        .with_ansi(false)
        .init();

    let block = tracked_alloc::<LedgerHooks>(128)?;
    tracing::info!(address = block.address(), "allocated");
    tracked_free::<LedgerHooks>(block);

    if LedgerHooks::OBSERVE_FREE.is_present() {
        LedgerHooks::OBSERVE_FREE.resolve()(0xbeef0);
    }

    Ok(())
}
