use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_DIRECTIVES: &str = "forecast=info,forecast_core=info";
const VERBOSE_DIRECTIVES: &str = "forecast=debug,forecast_core=debug";

/// Install the global subscriber. `RUST_LOG` wins over the defaults.
pub fn init_logging(verbose: bool) {
    let defaults = if verbose { VERBOSE_DIRECTIVES } else { DEFAULT_DIRECTIVES };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(defaults));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
