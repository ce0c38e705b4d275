mod app;
mod cli;
mod logging;
mod tsv;
mod tui;
mod worker;

use std::process::ExitCode;

use clap::Parser;
use cli::CliArgs;
use tracing::error;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    logging::init_logging(args.verbose);

    if let Err(err) = args.validate() {
        error!(error = %err, "invalid arguments");
        return ExitCode::FAILURE;
    }

    let config = match args.into_engine_config() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid arguments");
            return ExitCode::FAILURE;
        }
    };

    match app::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}
