use linkhook::logging::{
    colored_format_entry, slot, unix_micros_timestamp, FormatEntryFn, TimestampFn,
};
use linkhook::{print_wiring, Hook, LogHooks, Logger};

struct CustomLogHooks;

impl LogHooks for CustomLogHooks {
    const TIMESTAMP: Hook<TimestampFn> = slot::TIMESTAMP.with_override(unix_micros_timestamp);
    const FORMAT_ENTRY: Hook<FormatEntryFn> = slot::FORMAT_ENTRY.with_override(colored_format_entry);
}

fn main() {
    print_wiring("log hooks", &CustomLogHooks::wiring());

    let logger = Logger::<CustomLogHooks>::new();
    logger.emit("INFO", "Application started");
    logger.emit("DEBUG", "Processing data...");
    logger.emit("WARN", "Cache is cold");
    logger.emit("ERROR", "Failed to connect to database");
    logger.emit("INFO", "Application finished");
}
