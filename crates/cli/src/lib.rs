pub mod commands;

use clap::{Args, Parser, Subcommand};
use lunchly_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::commands::customers::CustomerAction;

#[derive(Debug, Parser)]
#[command(
    name = "lunchly",
    about = "Lunchly customer store CLI",
    long_about = "Manage the Lunchly customer database: migrations, demo data, readiness checks, and customer records.",
    after_help = "Examples:\n  lunchly migrate\n  lunchly customers search lee\n  lunchly customers top --limit 5"
)]
pub struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(subcommand)]
    command: Command,
}

/// Where configuration comes from, shared by every subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long, global = true, help = "Config file to read instead of lunchly.toml")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Database URL; wins over file and LUNCHLY_DATABASE_URL")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Log level; wins over file and LUNCHLY_LOG_LEVEL")]
    log_level: Option<String>,
}

impl From<ConfigArgs> for LoadOptions {
    fn from(args: ConfigArgs) -> Self {
        Self {
            require_file: args.config.is_some(),
            config_path: args.config,
            overrides: ConfigOverrides {
                database_url: args.database_url,
                log_level: args.log_level,
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo customers and reservations")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, DB connectivity, and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Read and write customer records")]
    Customers(CustomerAction),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions::from(cli.config);
    init_logging(&options);

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed => commands::seed::run(&options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(&options, json) }
        }
        Command::Customers(action) => commands::customers::run(&options, action),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command payload. An invalid
/// configuration falls back to defaults here; the command itself reports the
/// configuration error.
fn init_logging(options: &LoadOptions) {
    let config = AppConfig::load(options.clone()).unwrap_or_default();
    let filter = EnvFilter::try_new(config.logging.level.trim())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = installed {
        eprintln!("failed to initialize logging: {error}");
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use lunchly_core::config::LoadOptions;

    use super::{Cli, Command};

    #[test]
    fn global_flags_become_load_options() {
        let cli = Cli::try_parse_from([
            "lunchly",
            "customers",
            "list",
            "--database-url",
            "sqlite::memory:",
            "--config",
            "custom.toml",
        ])
        .expect("parse args");
        assert!(matches!(cli.command, Command::Customers(_)));

        let options = LoadOptions::from(cli.config);

        assert_eq!(options.config_path, Some(PathBuf::from("custom.toml")));
        assert!(options.require_file, "an explicit config file must exist");
        assert_eq!(options.overrides.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(options.overrides.log_level, None);
    }

    #[test]
    fn without_flags_config_file_is_optional() {
        let cli = Cli::try_parse_from(["lunchly", "migrate"]).expect("parse args");

        let options = LoadOptions::from(cli.config);

        assert!(!options.require_file);
        assert!(options.config_path.is_none());
    }
}
