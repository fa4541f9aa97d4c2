use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::ResultSet;

pub const DEFAULT_CSV_FILE: &str = "argo_data.csv";

/// Header line plus one line per row. Nulls become empty fields.
#[must_use]
pub fn to_csv(result: &ResultSet) -> String {
    let mut output = String::new();
    push_record(&mut output, result.columns.iter().map(String::as_str));
    for row in &result.rows {
        let fields = row.iter().map(ToString::to_string).collect::<Vec<_>>();
        push_record(&mut output, fields.iter().map(String::as_str));
    }
    output
}

pub fn write_csv(result: &ResultSet, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create export directory: {}", parent.display()))?;
    }
    std::fs::write(path, to_csv(result))
        .with_context(|| format!("failed to write CSV export: {}", path.display()))
}

fn push_record<'a>(output: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (index, field) in fields.enumerate() {
        if index > 0 {
            output.push(',');
        }
        output.push_str(&quote_field(field));
    }
    output.push('\n');
}

fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
