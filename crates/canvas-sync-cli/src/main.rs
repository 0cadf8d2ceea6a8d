use canvas_sync_core::logging;
use clap::Parser;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if logging::init_logging(cli.debug).is_err() {
        logging::init_logging_stderr(cli.debug);
    }

    if let Err(err) = cli.run().await {
        eprintln!("canvas-sync error: {:#}", err);
        std::process::exit(1);
    }
}
