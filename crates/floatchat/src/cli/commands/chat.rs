use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use super::{CommandContext, build_translator};
use crate::cli::app::GatewayArgs;
use crate::models::Role;
use crate::present::{
    DEFAULT_CSV_FILE, DEFAULT_PREVIEW_ROWS, EXAMPLE_QUESTIONS, example_question, plan_charts,
    render_table, write_csv,
};
use crate::session::{Session, TurnOutcome};
use crate::store::{QueryStore, SqliteStore};
use crate::translator::Translator;

const PROMPT: &str = "floatchat> ";

const HELP: &str = "Commands:
  /examples     list example questions
  /ask N        ask example question N
  /history      show the conversation so far
  /export [P]   save the current results as CSV (default argo_data.csv)
  /charts       describe the charts for the current results
  /clear        drop the current results
  /quit         leave";

#[derive(Debug, Clone, Args)]
pub struct ChatArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,
}

pub fn run(args: &ChatArgs, context: &CommandContext) -> Result<()> {
    let translator = build_translator(&args.gateway)?;
    let store = SqliteStore::from_config(&context.store_config);
    match store.record_count() {
        Ok(count) => debug!(records = count, "database ready"),
        Err(error) => eprintln!("warning: {error}"),
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut chat = ChatLoop {
        session: Session::new(),
        translator: &translator,
        store: &store,
        export_dir: &context.runtime_paths.cwd,
    };
    chat.run(stdin.lock(), stdout.lock())
}

/// Line-driven chat over any reader and writer.
pub struct ChatLoop<'a> {
    pub session: Session,
    pub translator: &'a Translator,
    pub store: &'a dyn QueryStore,
    /// Relative export paths resolve against this directory.
    pub export_dir: &'a Path,
}

enum Flow {
    Continue,
    Quit,
}

impl ChatLoop<'_> {
    pub fn run(&mut self, mut input: impl BufRead, mut output: impl Write) -> Result<()> {
        for entry in self.session.entries() {
            writeln!(output, "{}", entry.content)?;
        }
        writeln!(output, "Type a question, or /help for commands.")?;

        let mut line = String::new();
        loop {
            write!(output, "{PROMPT}")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line).context("failed to read input")? == 0 {
                writeln!(output)?;
                return Ok(());
            }
            let trimmed = line.trim();
            let flow = if let Some(command) = trimmed.strip_prefix('/') {
                self.command(command, &mut output)?
            } else {
                self.ask(trimmed, &mut output)?;
                Flow::Continue
            };
            if matches!(flow, Flow::Quit) {
                return Ok(());
            }
        }
    }

    fn ask(&mut self, question: &str, output: &mut impl Write) -> Result<()> {
        let outcome = self
            .session
            .handle_turn(question, self.translator, self.store);
        if matches!(outcome, TurnOutcome::Skipped) {
            return Ok(());
        }
        if let Some(entry) = self.session.entries().last() {
            writeln!(output, "{}", entry.content)?;
        }
        if let (TurnOutcome::Rows { .. }, Some(result)) = (&outcome, self.session.result()) {
            writeln!(output)?;
            write!(output, "{}", render_table(result, DEFAULT_PREVIEW_ROWS))?;
        }
        Ok(())
    }

    fn command(&mut self, command: &str, output: &mut impl Write) -> Result<Flow> {
        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        match name {
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => writeln!(output, "{HELP}")?,
            "examples" => {
                for (index, question) in EXAMPLE_QUESTIONS.iter().enumerate() {
                    writeln!(output, "{}. {question}", index + 1)?;
                }
            }
            "ask" => match argument.parse::<usize>().ok().and_then(example_question) {
                Some(question) => {
                    writeln!(output, "> {question}")?;
                    self.ask(question, output)?;
                }
                None => writeln!(
                    output,
                    "Usage: /ask N where N is 1-{}",
                    EXAMPLE_QUESTIONS.len()
                )?,
            },
            "history" => {
                for entry in self.session.entries() {
                    let speaker = match entry.role {
                        Role::User => "you",
                        Role::Assistant => "floatchat",
                    };
                    writeln!(output, "[{speaker}] {}", entry.content)?;
                }
            }
            "export" => self.export(argument, output)?,
            "charts" => match self.session.result() {
                Some(result) => {
                    let plan = plan_charts(result);
                    if plan.is_empty() {
                        writeln!(output, "No charts apply to these columns.")?;
                    }
                    for line in plan.summary_lines() {
                        writeln!(output, "- {line}")?;
                    }
                }
                None => writeln!(output, "No results yet. Ask a question first.")?,
            },
            "clear" => {
                self.session.clear_results();
                writeln!(output, "Results cleared.")?;
            }
            other => writeln!(output, "Unknown command /{other}. Try /help.")?,
        }
        Ok(Flow::Continue)
    }

    fn export(&self, argument: &str, output: &mut impl Write) -> Result<()> {
        let Some(result) = self.session.result() else {
            writeln!(output, "No results to export yet.")?;
            return Ok(());
        };
        let requested = if argument.is_empty() {
            PathBuf::from(DEFAULT_CSV_FILE)
        } else {
            PathBuf::from(argument)
        };
        let path = if requested.is_absolute() {
            requested
        } else {
            self.export_dir.join(requested)
        };
        match write_csv(result, &path) {
            Ok(()) => writeln!(
                output,
                "Saved {} rows to {}",
                result.len(),
                path.display()
            )?,
            Err(error) => writeln!(output, "❌ {error:#}")?,
        }
        Ok(())
    }
}
