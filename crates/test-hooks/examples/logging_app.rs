use linkhook::log_message;

fn main() {
    log_message("INFO", "Application started");
    log_message("DEBUG", "Processing data...");
    log_message("INFO", "Data processed successfully");
    log_message("ERROR", "Failed to connect to database");
    log_message("INFO", "Application finished");
}
