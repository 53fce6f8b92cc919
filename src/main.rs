use clap::Parser;
use mdboard::cli::commands::Cli;
use mdboard::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `MDB_LOG=debug`
const LOG_ENV: &str = "MDB_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
