use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{CommandContext, envelope_failure, policy_failure, print_envelope};
use crate::models::QueryEnvelope;
use crate::policy::validate_statement;
use crate::store::{QueryStore, SqliteStore};

#[derive(Debug, Clone, Args)]
pub struct SqlArgs {
    #[arg(value_name = "SQL")]
    pub sql: String,

    /// Row ceiling for this statement; never above the configured ceiling.
    #[arg(long, value_name = "N")]
    pub row_cap: Option<usize>,
}

pub fn run(args: &SqlArgs, context: &CommandContext) -> Result<()> {
    let validated = validate_statement(&args.sql).map_err(|violation| {
        policy_failure(
            QueryEnvelope::error("sql", violation.code(), format!("Query rejected: {violation}"))
                .with_meta("guardrail_checked", json!(true))
                .with_error_details(violation.details()),
        )
    })?;

    let row_ceiling = context.store_config.row_ceiling;
    let row_cap = args.row_cap.map_or(row_ceiling, |cap| cap.min(row_ceiling));
    if row_cap == 0 {
        return Err(envelope_failure(
            QueryEnvelope::error(
                "sql",
                "query_row_cap_invalid",
                "row_cap must be greater than zero",
            )
            .with_meta("guardrail_checked", json!(true))
            .with_error_details(json!({ "row_cap": row_cap })),
        ));
    }

    let store = SqliteStore::new(context.store_config.database_path.clone(), row_cap);
    let started = std::time::Instant::now();
    let result = store.execute(validated.statement()).map_err(|error| {
        let duration_ms = started.elapsed().as_millis() as u64;
        envelope_failure(
            QueryEnvelope::error("sql", "query_execution_failed", error.message())
                .with_meta("guardrail_checked", json!(true))
                .with_meta("row_cap", json!(row_cap))
                .with_meta("duration_ms", json!(duration_ms))
                .with_error_details(json!({
                    "database_path": store.path().display().to_string(),
                    "statement": validated.statement(),
                })),
        )
    })?;
    let duration_ms = started.elapsed().as_millis() as u64;

    let envelope = QueryEnvelope::ok("sql", json!({ "statement": validated.statement() }))
        .with_result_set(&result, row_cap)
        .with_meta("guardrail_checked", json!(true))
        .with_meta("referenced_columns", json!(validated.referenced_columns()))
        .with_meta("has_limit", json!(validated.has_limit()))
        .with_meta("duration_ms", json!(duration_ms));
    print_envelope(&envelope)
}
