use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::{info, warn};

use crate::models::MeasurementRecord;

pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 500;

const CREATE_ARGO_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS argo_floats (
    platform_number TEXT NOT NULL,
    cycle_number INTEGER NOT NULL,
    measurement_time TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    pressure REAL NOT NULL,
    temperature REAL NOT NULL,
    salinity REAL NOT NULL,
    data_quality TEXT NOT NULL,
    CHECK (latitude BETWEEN -90 AND 90),
    CHECK (longitude BETWEEN -180 AND 180),
    CHECK (pressure >= 0)
);
CREATE INDEX IF NOT EXISTS idx_argo_floats_platform
    ON argo_floats(platform_number, cycle_number);
CREATE INDEX IF NOT EXISTS idx_argo_floats_time
    ON argo_floats(measurement_time);
"#;

const INSERT_RECORD_SQL: &str = "INSERT INTO argo_floats (platform_number, cycle_number, \
     measurement_time, latitude, longitude, pressure, temperature, salinity, data_quality) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRejection {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub lines_read: usize,
    pub records_imported: usize,
    pub batches_committed: usize,
    pub rejected: Vec<ImportRejection>,
}

/// Writable connection used only by `import`; queries go through
/// [`super::SqliteStore`].
pub fn open_writable(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create database parent directory: {}",
                parent.display()
            )
        })?;
    }

    Connection::open(path)
        .with_context(|| format!("failed to open sqlite database: {}", path.display()))
}

pub fn ensure_argo_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(CREATE_ARGO_TABLE_SQL)
        .context("failed to create argo_floats table")
}

/// Returns `(records_written, batches_committed)`.
pub fn write_records_batched(
    connection: &mut Connection,
    records: &[MeasurementRecord],
    batch_size: usize,
) -> Result<(usize, usize)> {
    let mut records_written = 0_usize;
    let mut batches_committed = 0_usize;

    for batch in records.chunks(batch_size.max(1)) {
        let tx = connection
            .transaction()
            .context("failed to open sqlite transaction")?;
        {
            let mut statement = tx
                .prepare_cached(INSERT_RECORD_SQL)
                .context("failed to prepare measurement insert")?;
            for record in batch {
                statement
                    .execute(params![
                        record.platform_number,
                        record.cycle_number,
                        record.measurement_time,
                        record.latitude,
                        record.longitude,
                        record.pressure,
                        record.temperature,
                        record.salinity,
                        record.data_quality,
                    ])
                    .with_context(|| {
                        format!(
                            "failed to insert measurement platform={} cycle={}",
                            record.platform_number, record.cycle_number
                        )
                    })?;
                records_written += 1;
            }
        }
        tx.commit()
            .context("failed to commit sqlite batch transaction")?;
        batches_committed += 1;
    }

    Ok((records_written, batches_committed))
}

/// Reads one measurement per JSONL line. Invalid lines are reported and
/// skipped; valid ones are written in batches.
pub fn import_jsonl(
    jsonl_path: &Path,
    database_path: &Path,
    batch_size: usize,
) -> Result<ImportReport> {
    let input = std::fs::read_to_string(jsonl_path)
        .with_context(|| format!("failed to read JSONL file: {}", jsonl_path.display()))?;

    let mut records = Vec::new();
    let mut rejected = Vec::new();
    let mut lines_read = 0_usize;
    for (index, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        lines_read += 1;
        let line_number = index + 1;
        match parse_record_line(line) {
            Ok(record) => records.push(record),
            Err(error) => {
                warn!(line = line_number, error = %format!("{error:#}"), "skipping measurement");
                rejected.push(ImportRejection {
                    line: line_number,
                    reason: format!("{error:#}"),
                });
            }
        }
    }

    let mut connection = open_writable(database_path)?;
    ensure_argo_schema(&connection)?;
    let (records_imported, batches_committed) =
        write_records_batched(&mut connection, &records, batch_size)?;
    info!(
        records_imported,
        rejected = rejected.len(),
        database = %database_path.display(),
        "measurement import finished"
    );

    Ok(ImportReport {
        lines_read,
        records_imported,
        batches_committed,
        rejected,
    })
}

fn parse_record_line(line: &str) -> Result<MeasurementRecord> {
    serde_json::from_str::<MeasurementRecord>(line)
        .context("invalid measurement JSON")?
        .validated()
}
