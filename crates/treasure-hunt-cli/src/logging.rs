//! Tracing subscriber setup from the `logging` config section.

use tracing_subscriber::EnvFilter;

use treasure_hunt_core::config::LoggingConfig;

/// Filter directives: base level first, then per-crate overrides.
///
/// `-v` forces `debug` as the base level.
fn filter_directives(logging: Option<&LoggingConfig>, verbose: bool) -> String {
    let level = if verbose {
        "debug"
    } else {
        logging
            .and_then(|l| l.level.as_deref())
            .filter(|l| !l.is_empty())
            .unwrap_or("info")
    };

    let mut directives = level.to_string();
    for filter in logging.map(|l| l.filters.as_slice()).unwrap_or_default() {
        directives.push(',');
        directives.push_str(filter);
    }
    directives
}

/// Install the global subscriber. `RUST_LOG` wins over the config.
pub fn init_logging(logging: Option<&LoggingConfig>, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(logging, verbose)));

    let json = logging.is_some_and(|l| l.format == "json");
    let stdout = logging.is_some_and(|l| l.output == "stdout");
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match (json, stdout) {
        (true, true) => builder.json().with_writer(std::io::stdout).init(),
        (true, false) => builder.json().with_writer(std::io::stderr).init(),
        (false, true) => builder.with_writer(std::io::stdout).init(),
        (false, false) => builder.with_writer(std::io::stderr).init(),
    }
}
