use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use serde_json::json;

use super::{CommandContext, envelope_failure, print_envelope};
use crate::models::{QueryEnvelope, json_schema};
use crate::store::import::{DEFAULT_IMPORT_BATCH_SIZE, import_jsonl};

#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    /// One measurement object per line.
    #[arg(value_name = "JSONL", required_unless_present = "schema")]
    pub input: Option<PathBuf>,

    /// Print the JSON schema of one measurement line and exit.
    #[arg(long, default_value_t = false)]
    pub schema: bool,

    #[arg(long, default_value_t = DEFAULT_IMPORT_BATCH_SIZE)]
    pub batch_size: usize,
}

pub fn run(args: &ImportArgs, context: &CommandContext) -> Result<()> {
    if args.schema {
        return print_envelope(&QueryEnvelope::ok("import", json_schema()));
    }
    let Some(input) = args.input.as_deref() else {
        bail!("a JSONL input path is required");
    };
    let input = context.runtime_paths.resolve(input)?;
    let database_path = &context.store_config.database_path;
    if args.batch_size == 0 {
        return Err(envelope_failure(
            QueryEnvelope::error(
                "import",
                "import_batch_size_invalid",
                "batch_size must be greater than zero",
            )
            .with_error_details(json!({ "batch_size": args.batch_size })),
        ));
    }

    let report = import_jsonl(&input, database_path, args.batch_size).map_err(|error| {
        envelope_failure(
            QueryEnvelope::error("import", "import_failed", "measurement import failed")
                .with_error_details(json!({
                    "input": input.display().to_string(),
                    "database_path": database_path.display().to_string(),
                    "cause": format!("{error:#}"),
                })),
        )
    })?;

    let mut envelope = QueryEnvelope::ok("import", json!(report))
        .with_meta("input", json!(input.display().to_string()))
        .with_meta("database_path", json!(database_path.display().to_string()))
        .with_meta("batch_size", json!(args.batch_size));
    if !report.rejected.is_empty() {
        envelope = envelope
            .with_warning(
                "records_rejected",
                format!("{} lines were skipped", report.rejected.len()),
            )
            .with_warning_details(json!({ "rejected_count": report.rejected.len() }));
    }
    print_envelope(&envelope)
}
