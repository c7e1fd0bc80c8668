use tracing_subscriber::EnvFilter;

/// Initialise logging to stderr.
///
/// The default level is `warn`, or `debug` when `verbose` is set. A filter
/// from `LORE_LOG` replaces either default. Calling this twice is harmless.
pub fn init(verbose: bool, filter: Option<&str>) {
    let level = if verbose { "debug" } else { "warn" };

    let filter = filter
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
