pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hiredesk_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};

#[derive(Debug, Parser)]
#[command(
    name = "hiredesk",
    about = "Hire desk operator CLI",
    long_about = "Inspect hire desk configuration, check backend readiness, and smoke-test the interaction wizard.",
    after_help = "Examples:\n  hiredesk doctor --json\n  hiredesk config\n  hiredesk smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, API address shape, and backend reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
        #[arg(long, help = "Check against this base URL instead of the configured one")]
        base_url: Option<String>,
        #[arg(long, help = "Skip the checks that need a reachable backend")]
        offline: bool,
    },
    #[command(about = "Drive the wizard end to end against the built-in fixture backend")]
    Smoke,
}

pub fn run() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json, base_url, offline } => commands::CommandResult {
            exit_code: 0,
            output: commands::doctor::run(json, base_url, offline),
        },
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Commands report config problems in their own output, so a failed
/// load here only means logging falls back to the defaults.
fn init_logging() {
    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| LoggingConfig { level: "info".to_string(), format: LogFormat::Compact });

    let log_level = logging.level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let builder = tracing_subscriber::fmt().with_target(false).with_max_level(log_level);

    let result = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    // A second init in the same process is harmless; keep the first
    // subscriber.
    let _ = result;
}
