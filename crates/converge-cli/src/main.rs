//! converge: replay scripted resource lifecycles through the convergence
//! waiter and inspect the default waiter configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use converge_backends::fabric::connection;
use converge_backends::metal::gateway;
use converge_backends::network_edge::BGP_POLL_INTERVAL;
use converge_cli::{Scenario, simulate};
use converge_core::defaults::VIRTUAL_CIRCUIT_TIMEOUT_MARGIN;
use converge_core::{Cadence, OperationTimeouts};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "converge")]
#[command(about = "Simulate resource convergence waits")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario file through the waiter and print the outcome as JSON
    Simulate {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },

    /// Print default operation timeouts and polling cadences
    Defaults,
}

// Scenario waits are simulated, so the clock starts paused and jumps
// straight to the next timer.
#[tokio::main(flavor = "current_thread", start_paused = true)]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

fn init_logging(verbose: bool, json: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Returns whether the command succeeded
async fn run() -> Result<bool> {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs);

    match args.command {
        Command::Simulate { scenario } => {
            let loaded = Scenario::load(&scenario)?;
            info!(
                scenario = %scenario.display(),
                resource = %loaded.resource,
                steps = loaded.steps.len(),
                "Simulating wait"
            );
            let outcome = simulate::run(&loaded).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("Failed to encode outcome")?
            );
            Ok(outcome.converged())
        }

        Command::Defaults => {
            println!(
                "{}",
                serde_json::to_string_pretty(&defaults_report())
                    .context("Failed to encode defaults")?
            );
            Ok(true)
        }
    }
}

fn cadence_json(cadence: Cadence) -> serde_json::Value {
    serde_json::json!({
        "initial_delay_secs": cadence.initial_delay.unwrap_or(cadence.interval).as_secs(),
        "interval_secs": cadence.interval.as_secs(),
        "min_interval_secs": cadence.min_interval.as_secs(),
    })
}

fn defaults_report() -> serde_json::Value {
    serde_json::json!({
        "timeouts": {
            "default": OperationTimeouts::default(),
            "fabric_connection": connection::default_timeouts(),
            "metal_gateway": gateway::default_timeouts(),
            "virtual_circuit_margin_secs": VIRTUAL_CIRCUIT_TIMEOUT_MARGIN.as_secs(),
        },
        "cadences": {
            "standard": cadence_json(Cadence::STANDARD),
            "slow": cadence_json(Cadence::SLOW),
            "network_edge_bgp": cadence_json(Cadence::immediate(BGP_POLL_INTERVAL)),
        },
    })
}
