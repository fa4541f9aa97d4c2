use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Args;
use serde_json::json;

use super::{CommandContext, build_translator, envelope_failure, policy_failure, print_envelope};
use crate::cli::app::GatewayArgs;
use crate::models::{QueryEnvelope, TranslationResult};
use crate::policy::validate_statement;
use crate::present::{DEFAULT_PREVIEW_ROWS, plan_charts, render_table, write_csv};
use crate::session::{Session, TurnFailure, TurnOutcome};
use crate::store::SqliteStore;
use crate::translator::Translator;

#[derive(Debug, Clone, Args)]
pub struct AskArgs {
    #[arg(value_name = "QUESTION")]
    pub question: String,

    /// Print a JSON envelope instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Also write the result set to this CSV file.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Include chart plans for the result set.
    #[arg(long, default_value_t = false)]
    pub charts: bool,

    /// Translate and validate without running the query.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[command(flatten)]
    pub gateway: GatewayArgs,
}

pub fn run(args: &AskArgs, context: &CommandContext) -> Result<()> {
    if args.question.trim().is_empty() {
        return Err(envelope_failure(QueryEnvelope::error(
            "ask",
            "question_empty",
            "question must not be blank",
        )));
    }

    let translator = build_translator(&args.gateway)?;
    if args.dry_run {
        return run_dry(args, &translator);
    }

    let store = SqliteStore::from_config(&context.store_config);
    let mut session = Session::new();
    let outcome = session.handle_turn(&args.question, &translator, &store);
    let reply = session
        .entries()
        .last()
        .map(|entry| entry.content.clone())
        .unwrap_or_default();

    match outcome {
        TurnOutcome::Skipped => Err(envelope_failure(QueryEnvelope::error(
            "ask",
            "question_empty",
            "question must not be blank",
        ))),
        TurnOutcome::Rows { sql_text, .. } => {
            let result = session
                .result()
                .ok_or_else(|| anyhow!("turn reported rows without a result set"))?;
            let csv_path = args
                .csv
                .as_deref()
                .map(|path| context.runtime_paths.resolve(path))
                .transpose()?;
            if let Some(path) = &csv_path {
                write_csv(result, path)?;
            }
            let charts = args.charts.then(|| plan_charts(result));

            if args.json {
                let mut data = json!({ "kind": "rows", "sql_text": sql_text });
                if let Some(plan) = &charts {
                    data["charts"] = json!(plan);
                }
                let mut envelope = QueryEnvelope::ok("ask", data)
                    .with_result_set(result, store.row_ceiling())
                    .with_meta("model", json!(translator.model_name()));
                if let Some(path) = &csv_path {
                    envelope = envelope.with_meta("csv_path", json!(path.display().to_string()));
                }
                return print_envelope(&envelope);
            }

            println!("{reply}\n");
            print!("{}", render_table(result, DEFAULT_PREVIEW_ROWS));
            if let Some(plan) = &charts {
                println!();
                if plan.is_empty() {
                    println!("No charts apply to these columns.");
                }
                for line in plan.summary_lines() {
                    println!("- {line}");
                }
            }
            if let Some(path) = &csv_path {
                println!("Saved {} rows to {}", result.len(), path.display());
            }
            Ok(())
        }
        TurnOutcome::Answer { text } => {
            if args.json {
                let envelope = QueryEnvelope::ok("ask", json!({ "kind": "answer", "text": text }))
                    .with_meta("model", json!(translator.model_name()));
                return print_envelope(&envelope);
            }
            println!("{text}");
            Ok(())
        }
        TurnOutcome::Failed { sql_text, failure } => {
            if !args.json {
                println!("{reply}");
            }
            let mut details = json!({ "sql_text": sql_text, "transcript_entry": reply });
            if let TurnFailure::Policy(violation) = &failure {
                details["policy"] = violation.details();
            }
            let envelope = QueryEnvelope::error("ask", failure.code(), failure.to_string())
                .with_meta("model", json!(translator.model_name()))
                .with_error_details(details);
            match failure {
                TurnFailure::Policy(_) => Err(policy_failure(envelope)),
                TurnFailure::Translation { .. } | TurnFailure::Execution(_) => {
                    Err(envelope_failure(envelope))
                }
            }
        }
    }
}

fn run_dry(args: &AskArgs, translator: &Translator) -> Result<()> {
    let (translation, _) = translator.translate(&args.question);
    match translation {
        TranslationResult::Query { sql_text } => match validate_statement(&sql_text) {
            Ok(validated) => {
                if args.json {
                    let envelope = QueryEnvelope::ok(
                        "ask",
                        json!({
                            "kind": "query",
                            "sql_text": sql_text,
                            "statement": validated.statement(),
                            "referenced_columns": validated.referenced_columns(),
                            "has_limit": validated.has_limit(),
                        }),
                    )
                    .with_meta("dry_run", json!(true))
                    .with_meta("model", json!(translator.model_name()));
                    return print_envelope(&envelope);
                }
                println!("```sql\n{sql_text}\n```");
                Ok(())
            }
            Err(violation) => Err(policy_failure(
                QueryEnvelope::error(
                    "ask",
                    violation.code(),
                    format!("Query rejected: {violation}"),
                )
                .with_meta("dry_run", json!(true))
                .with_error_details(json!({ "sql_text": sql_text, "policy": violation.details() })),
            )),
        },
        TranslationResult::Answer { text } => {
            if args.json {
                let envelope = QueryEnvelope::ok("ask", json!({ "kind": "answer", "text": text }))
                    .with_meta("dry_run", json!(true));
                return print_envelope(&envelope);
            }
            println!("{text}");
            Ok(())
        }
        TranslationResult::Failure { reason } => Err(envelope_failure(
            QueryEnvelope::error("ask", "translation_failed", reason)
                .with_meta("dry_run", json!(true)),
        )),
    }
}
