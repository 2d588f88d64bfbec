//! check-es-aggregation - Nagios plugin for Elasticsearch aggregations
//!
//! Runs one windowed metric aggregation against an index pattern, compares
//! the value with warning/critical ranges and prints a single status line
//! with perfdata. The process exit code is the Nagios state.

mod args;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use esagg_core::{
    connect_failed, run_check, BackendResult, CheckConfig, SearchBackend, Severity,
};
use esagg_http::{EsClient, EsConfig};
use tracing::debug;

use crate::args::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                Severity::Unknown.exit_code()
            } else {
                0
            };
            err.print().ok();
            return ExitCode::from(code);
        }
    };

    esagg_core::init_tracing(cli.json, esagg_core::level_for(cli.verbose, cli.debug));

    let config = cli.to_config();
    let connect = |config: &CheckConfig| EsClient::new(EsConfig::from_check(config));
    match execute(&config, connect, &mut std::io::stdout()).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("UNKNOWN: {err:#}");
            ExitCode::from(Severity::Unknown.exit_code())
        }
    }
}

/// Validate, search, write the status line. Returns the Nagios exit code.
///
/// Configuration errors are written one per line and exit UNKNOWN without
/// calling `connect`.
async fn execute<B, F, W>(config: &CheckConfig, connect: F, out: &mut W) -> Result<u8>
where
    B: SearchBackend,
    F: FnOnce(&CheckConfig) -> BackendResult<B>,
    W: Write,
{
    let check = match config.validate() {
        Ok(check) => check,
        Err(errors) => {
            debug!(count = errors.len(), "configuration rejected");
            print_lines(out, &errors.to_string())?;
            return Ok(Severity::Unknown.exit_code());
        }
    };

    let outcome = match connect(check.config()) {
        Ok(backend) => run_check(&check, &backend, Utc::now()).await,
        Err(err) => connect_failed(&check, &err),
    };

    print_lines(out, &outcome.render())?;
    Ok(outcome.exit_code())
}

fn print_lines<W: Write>(out: &mut W, text: &str) -> Result<()> {
    writeln!(out, "{text}").context("Failed to write status line")?;
    out.flush().context("Failed to flush stdout")
}
