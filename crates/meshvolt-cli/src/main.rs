// Command-line front end for the mesh telemetry engine.
//
// Maps flags and environment variables onto an EngineConfig, sets up
// tracing, and runs one engine operation. The engine itself never reads
// config files or global state -- everything flows through here.

use std::net::IpAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use meshvolt_core::{Engine, EngineConfig};

#[derive(Parser)]
#[command(
    name = "meshvolt",
    about = "Battery telemetry for self-forming radio meshes",
    version
)]
struct Cli {
    /// Root radio address (the mesh entry point).
    #[arg(long, env = "MESHVOLT_ROOT")]
    root: IpAddr,

    /// Control endpoint username.
    #[arg(long, env = "MESHVOLT_USERNAME", default_value = "configurator")]
    username: String,

    /// Control endpoint password.
    #[arg(long, env = "MESHVOLT_PASSWORD", hide_env_values = true)]
    password: String,

    /// Topology cache TTL (e.g. "60s", "5m").
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    ttl: Duration,

    /// Per-call network timeout.
    #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Maximum number of concurrent station polls.
    #[arg(long, default_value_t = 10)]
    width: usize,

    /// Overall poll deadline; stragglers are abandoned (snapshot only).
    #[arg(long, value_parser = humantime::parse_duration)]
    deadline: Option<Duration>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll every reachable station and print readings as JSON.
    Snapshot,
    /// Read the root radio's battery level once.
    Root,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = EngineConfig {
        root_address: cli.root,
        username: cli.username.clone(),
        password: SecretString::from(cli.password.clone()),
        topology_ttl: cli.ttl,
        request_timeout: cli.timeout,
        poll_width: cli.width,
        ..EngineConfig::default()
    };

    let engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Snapshot => {
            let readings = engine.snapshot_within(cli.deadline).await;
            tracing::info!(count = readings.len(), "poll complete");
            let out = serde_json::to_string_pretty(&readings)
                .unwrap_or_else(|e| format!("[] /* serialization failed: {e} */"));
            println!("{out}");
        }
        Command::Root => match engine.read_root().await {
            Ok(level) => println!("{:.3} V  {:.1} %", level.voltage, level.percentage),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}
