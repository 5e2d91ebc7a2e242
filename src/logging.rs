use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive for a verbosity level; `RUST_LOG` takes precedence
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "schemadoc=warn";
    }
    match verbose {
        0 => "schemadoc=info",
        1 => "schemadoc=debug",
        _ => "schemadoc=trace",
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean for output.
#[cfg(not(tarpaulin_include))]
pub fn init(verbose: u8, quiet: bool) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(verbose, quiet).into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
