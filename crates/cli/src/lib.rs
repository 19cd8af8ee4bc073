pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rfqflow_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "rfqflow",
    about = "RFQ workflow inspection CLI",
    long_about = "Inspect RFQ snapshots against the procurement workflow: stage table, transition legality, alerts, next actions and batch reports.",
    after_help = "Examples:\n  rfqflow stages\n  rfqflow inspect rfq.json\n  rfqflow transition --from sent --to draft\n  rfqflow plan rfq.json --action send --actor buyer-7\n  rfqflow report rfqs.json --overdue-days 10"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to an rfqflow.toml configuration file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the configured log level")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Override the configured log format (compact|pretty|json)")]
    log_format: Option<LogFormat>,
    #[arg(long, global = true, help = "Override the imminent-deadline warning window in days")]
    deadline_warning_days: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Print the workflow stage table with allowed actions")]
    Stages,
    #[command(about = "Show progress, next action and alerts for one RFQ snapshot")]
    Inspect {
        file: PathBuf,
        #[arg(long, help = "Evaluation instant (RFC 3339); defaults to now")]
        now: Option<String>,
    },
    #[command(about = "Check whether a stage transition is legal")]
    Transition {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    #[command(about = "Validate an action against an RFQ and print the resulting plan")]
    Plan {
        file: PathBuf,
        #[arg(long)]
        action: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        note: Option<String>,
        #[arg(long, help = "Evaluation instant (RFC 3339); defaults to now")]
        now: Option<String>,
    },
    #[command(about = "Aggregate statistics, overdue and no-response RFQs from a JSON array")]
    Report {
        file: PathBuf,
        #[arg(long, help = "Evaluation instant (RFC 3339); defaults to now")]
        now: Option<String>,
        #[arg(long, help = "Staleness window for waiting RFQs without a deadline")]
        overdue_days: Option<u32>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Stages => "stages",
            Self::Inspect { .. } => "inspect",
            Self::Transition { .. } => "transition",
            Self::Plan { .. } => "plan",
            Self::Report { .. } => "report",
            Self::Config => "config",
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = execute(cli);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

pub fn execute(cli: Cli) -> CommandResult {
    let command_name = cli.command.name();
    let overrides = ConfigOverrides {
        log_level: cli.log_level,
        log_format: cli.log_format,
        deadline_warning_days: cli.deadline_warning_days,
        overdue_days: match cli.command {
            Command::Report { overdue_days, .. } => overdue_days,
            _ => None,
        },
    };
    let options = LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        overrides: overrides.clone(),
    };

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command_name,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Stages => commands::stages::run(),
        Command::Inspect { file, now } => commands::inspect::run(&config, &file, now.as_deref()),
        Command::Transition { from, to } => commands::transition::run(&from, &to),
        Command::Plan { file, action, actor, note, now } => commands::plan::run(
            &config,
            &commands::plan::PlanArgs { file, action, actor, note, now },
        ),
        Command::Report { file, now, .. } => commands::report::run(&config, &file, now.as_deref()),
        Command::Config => commands::config::run(&config, cli.config.as_deref(), &overrides),
    };

    tracing::debug!(
        event_name = "cli.command.finished",
        command = command_name,
        exit_code = result.exit_code,
        "command finished"
    );
    result
}

fn init_logging(config: &AppConfig) {
    use rfqflow_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    // Logs go to stderr so stdout stays a single JSON document.
    let _ = match config.logging.format {
        Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .compact()
            .try_init(),
        Pretty => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .pretty()
            .try_init(),
        Json => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .json()
            .try_init(),
    };
}
