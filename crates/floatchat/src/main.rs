#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use floatchat::cli::app::{Cli, Command, RuntimeArgs};
use floatchat::cli::commands::{self, CommandContext, env_lookup};
use floatchat::config::{RuntimePaths, StoreConfig};
use floatchat::logging::init_logging;
use floatchat::models::QueryEnvelopeCommandFailure;
use tracing::{debug, info};

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_POLICY_VIOLATION: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    let command_name = cli.command.name();
    debug!(command = command_name, "starting");

    match execute(cli) {
        Ok(()) => {
            debug!(command = command_name, "completed");
            EXIT_SUCCESS
        }
        Err(error) => {
            let exit_code = classify_runtime_error(&error);
            info!(command = command_name, exit_code, "command failed");
            eprintln!("{error:#}");
            exit_code
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Ask(args) => commands::ask::run(args, &resolve_context(&cli.runtime)?),
        Command::Chat(args) => commands::chat::run(args, &resolve_context(&cli.runtime)?),
        Command::Sql(args) => commands::sql::run(args, &resolve_context(&cli.runtime)?),
        Command::Status(args) => commands::status::run(args, &resolve_context(&cli.runtime)?),
        Command::Import(args) => commands::import::run(args, &resolve_context(&cli.runtime)?),
        Command::Examples(args) => commands::examples::run(args),
    }
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<QueryEnvelopeCommandFailure>() {
        Some(failure) if failure.is_policy_violation() => EXIT_POLICY_VIOLATION,
        _ => EXIT_RUNTIME_FAILURE,
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    let _ = error.print();
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
        _ => EXIT_USAGE_ERROR,
    }
}

fn resolve_context(args: &RuntimeArgs) -> Result<CommandContext> {
    let runtime_paths = resolve_runtime_paths(args)?;
    let store_config = StoreConfig::resolve(&runtime_paths, args.database.as_deref(), env_lookup)?;
    debug!(database = %store_config.database_path.display(), "store configured");
    Ok(CommandContext {
        runtime_paths,
        store_config,
    })
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    floatchat::config::resolve_runtime_paths(&home_dir, &cwd, args.data_dir.as_deref())
}
