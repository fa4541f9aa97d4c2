use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    ask::AskArgs, chat::ChatArgs, examples::ExamplesArgs, import::ImportArgs, sql::SqlArgs,
    status::StatusArgs,
};

#[derive(Debug, Parser)]
#[command(
    name = "floatchat",
    version,
    about = "Ask questions about ARGO float measurements in plain language"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    /// Directory holding the default database (defaults to ~/.floatchat).
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// SQLite database file; overrides FLOATCHAT_DATABASE.
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,
}

/// Language model settings shared by the commands that call the model.
#[derive(Debug, Clone, Default, Args)]
pub struct GatewayArgs {
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one question through the model and the database.
    Ask(AskArgs),
    /// Interactive session.
    Chat(ChatArgs),
    /// Run a read-only statement directly.
    Sql(SqlArgs),
    /// Report database health.
    Status(StatusArgs),
    /// Load measurements from a JSONL file.
    Import(ImportArgs),
    /// List example questions.
    Examples(ExamplesArgs),
}

impl Command {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ask(_) => "ask",
            Self::Chat(_) => "chat",
            Self::Sql(_) => "sql",
            Self::Status(_) => "status",
            Self::Import(_) => "import",
            Self::Examples(_) => "examples",
        }
    }
}
