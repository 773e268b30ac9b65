use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Sweep and debounce activity is
/// logged at debug; enable it with `RUST_LOG=info,cache=debug,service::storage=debug`.
const DEFAULT_FILTER: &str = "info,cache=info,service=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Compact single-line output on stdout.
///
/// Both formats keep the event target so a line can be traced back to the
/// `cache` or `service` module named in the filter.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Structured JSON output on stdout, one object per event.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the output format from a config string (`"json"` or anything else for compact).
pub fn init_logging(format: &str) {
    if format.eq_ignore_ascii_case("json") {
        init_logging_json();
    } else {
        init_logging_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(DEFAULT_FILTER.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging("json");
        init_logging("compact");
        init_logging("JSON");
        tracing::info!(target: "cache", "still logging");
    }
}
