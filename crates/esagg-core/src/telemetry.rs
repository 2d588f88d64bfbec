//! Centralised tracing initialisation for the check binary.
//!
//! Log lines go to stderr: stdout is reserved for the single status line
//! read by the monitoring system. Many schedulers merge stderr into the
//! plugin output, so the default level only lets errors through.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Verbosity selected by the `--verbose` / `--debug` flags.
pub fn level_for(verbose: bool, debug: bool) -> Level {
    if debug {
        Level::TRACE
    } else if verbose {
        Level::DEBUG
    } else {
        Level::ERROR
    }
}

/// Initialise the global tracing subscriber.
///
/// * `json`: emit newline-delimited JSON log lines.
/// * `level`: default verbosity when `RUST_LOG` is not set.
///
/// Colour codes are only written when stderr is a terminal. Only the
/// first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let ansi = std::io::stderr().is_terminal();

    let layer = fmt::layer()
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(std::io::stderr);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_flags() {
        assert_eq!(level_for(false, false), Level::ERROR);
        assert_eq!(level_for(true, false), Level::DEBUG);
        assert_eq!(level_for(false, true), Level::TRACE);
        assert_eq!(level_for(true, true), Level::TRACE);
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(false, Level::ERROR);
        init_tracing(true, Level::DEBUG);
    }
}
