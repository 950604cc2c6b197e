//! Hoist - Entry Point
//!
//! Deploys git repositories to remote hosts over ssh.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use hoist::app::options::{default_audit_log, AppOptions, DEFAULT_CONFIG_FILE};
use hoist::app::run::{run, Outcome, Verb};
use hoist::logs::{init_logging, LogLevel, LogOptions};

/// Deploy a git repository by resetting a remote working copy
#[derive(Parser)]
#[command(name = "hoist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Environment configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Change to this directory before doing anything
    #[arg(short = 'C', long, global = true)]
    chdir: Option<PathBuf>,

    /// Deploy even with uncommitted or unpushed local changes
    #[arg(short, long, global = true)]
    force: bool,

    /// Where to record dispatched commands
    #[arg(long, global = true)]
    audit_log: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the remote directories and clone the repository
    Setup,

    /// Deploy a ref (default: the configured ref, else the most recent one)
    Deploy {
        /// Branch, tag or commit to deploy
        #[arg(value_name = "REF")]
        git_ref: Option<String>,

        /// Branch name, derived from the ref when omitted
        #[arg(long)]
        branch: Option<String>,
    },

    /// Print the currently deployed commit
    #[command(alias = "curr")]
    Current,

    /// Print the previously deployed commit
    #[command(alias = "prev")]
    Previous,

    /// Print the n-th most recent deployed commit (1 is current)
    Commit {
        n: usize,
    },

    /// List deploys, most recent first
    List,

    /// Redeploy the commit N deploys before the current one
    Revert {
        #[arg(default_value_t = 1)]
        n: usize,
    },

    /// Run a command in the working copy
    Run {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Open a shell in the working copy
    Console,

    /// Print a configuration value
    Config {
        key: String,
    },
}

impl Cli {
    fn into_parts(self) -> (AppOptions, Verb) {
        let options = AppOptions {
            config_path: self.config,
            chdir: self.chdir,
            force: self.force,
            audit_log: self.audit_log.unwrap_or_else(default_audit_log),
            log: LogOptions {
                log_level: self.log_level,
                json_format: self.json_logs,
            },
        };

        let verb = match self.command {
            Commands::Setup => Verb::Setup,
            Commands::Deploy { git_ref, branch } => Verb::Deploy { git_ref, branch },
            Commands::Current => Verb::Current,
            Commands::Previous => Verb::Previous,
            Commands::Commit { n } => Verb::Commit(n),
            Commands::List => Verb::List,
            Commands::Revert { n } => Verb::Revert(n),
            Commands::Run { command } => Verb::Run(command.join(" ")),
            Commands::Console => Verb::Console,
            Commands::Config { key } => Verb::ConfigGet(key),
        };

        (options, verb)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let (options, verb) = Cli::parse().into_parts();

    if let Err(e) = init_logging(options.log.clone()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match run(&options, verb).await {
        Ok(Outcome::Print(text)) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Ok(Outcome::Silent) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
