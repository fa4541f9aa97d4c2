use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{CommandContext, envelope_failure, print_envelope};
use crate::models::QueryEnvelope;
use crate::store::{QueryStore, SqliteStore};

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    /// Print a JSON envelope instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &StatusArgs, context: &CommandContext) -> Result<()> {
    let store = SqliteStore::from_config(&context.store_config);
    let database_path = store.path().display().to_string();
    let unavailable = |message: &str| {
        envelope_failure(
            QueryEnvelope::error("status", "store_unavailable", message)
                .with_error_details(json!({ "database_path": database_path })),
        )
    };

    let description = store
        .describe()
        .map_err(|error| unavailable(error.message()))?;
    let record_count = if description.is_complete() {
        store
            .record_count()
            .map_err(|error| unavailable(error.message()))?
    } else {
        0
    };

    if !args.json {
        println!("database: {database_path}");
        println!("table: {}", description.table);
        println!("records: {record_count}");
        println!("row ceiling: {}", store.row_ceiling());
        if !description.is_complete() {
            println!(
                "missing columns: {}",
                description.missing_columns.join(", ")
            );
        }
        return Ok(());
    }

    let mut envelope = QueryEnvelope::ok(
        "status",
        json!({
            "database_path": database_path,
            "table": description.table,
            "columns": description.columns,
            "missing_columns": description.missing_columns,
            "record_count": record_count,
            "row_ceiling": store.row_ceiling(),
        }),
    );
    if !description.is_complete() {
        envelope = envelope
            .with_warning(
                "schema_incomplete",
                "measurement table is missing expected columns",
            )
            .with_warning_details(json!({ "missing_columns": description.missing_columns }));
    }
    print_envelope(&envelope)
}
