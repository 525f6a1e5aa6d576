//! Diagnostic logging
//!
//! Installs a `tracing` subscriber on stderr:
//! - `RUST_LOG` overrides the filter
//! - default is `qtl=warn`, or `qtl=debug` when verbose
//! - JSON lines when `RUST_LOG_FORMAT=json`

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    let default = if verbose { "qtl=debug" } else { "qtl=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let is_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose);

    if is_json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
        tracing::debug!("still logging");
    }
}
