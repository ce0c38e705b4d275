use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber, writing to stderr so stdout
/// stays free for TSV output. `--verbose` raises the default level to debug;
/// `RUST_LOG` always wins when set.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
