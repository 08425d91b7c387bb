use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `NOTEFOLD_LOG` takes an `EnvFilter`
/// directive and wins over `verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env("NOTEFOLD_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
