//! Machine-readable output shared by every non-interactive command.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::models::ResultSet;
use crate::utils::time::envelope_time_now;

pub const QUERY_ENVELOPE_SCHEMA_VERSION: &str = "floatchat.query-envelope.v1";

/// A warning or an error: stable code, human message, optional detail block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeIssue {
    pub code: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EnvelopeIssue {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEnvelope {
    pub ok: bool,
    pub command: String,
    pub generated_at_utc: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    pub meta: BTreeMap<String, Value>,
    pub warnings: Vec<EnvelopeIssue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeIssue>,
}

/// A failed envelope travelling through `anyhow`; `main` prints it and
/// derives the exit code from `is_policy_violation`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", encode_compact(.envelope))]
pub struct QueryEnvelopeCommandFailure {
    envelope: QueryEnvelope,
    policy_violation: bool,
}

impl QueryEnvelopeCommandFailure {
    #[must_use]
    pub fn new(envelope: QueryEnvelope) -> Self {
        Self {
            envelope,
            policy_violation: false,
        }
    }

    #[must_use]
    pub fn policy_violation(envelope: QueryEnvelope) -> Self {
        Self {
            envelope,
            policy_violation: true,
        }
    }

    #[must_use]
    pub fn envelope(&self) -> &QueryEnvelope {
        &self.envelope
    }

    #[must_use]
    pub const fn is_policy_violation(&self) -> bool {
        self.policy_violation
    }
}

fn encode_compact(envelope: &QueryEnvelope) -> String {
    serde_json::to_string(envelope)
        .unwrap_or_else(|error| format!("failed to encode {} envelope: {error}", envelope.command))
}

impl QueryEnvelope {
    fn new(command: impl Into<String>, ok: bool) -> Self {
        Self {
            ok,
            command: command.into(),
            generated_at_utc: envelope_time_now(),
            data: None,
            meta: BTreeMap::from([(
                "schema_version".to_string(),
                json!(QUERY_ENVELOPE_SCHEMA_VERSION),
            )]),
            warnings: Vec::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn ok(command: impl Into<String>, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::new(command, true)
        }
    }

    #[must_use]
    pub fn error(
        command: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(EnvelopeIssue::new(code, message)),
            ..Self::new(command, false)
        }
    }

    /// Adds `columns` and `rows` to the data object and records the result
    /// shape in `meta`. A truncated result also gets a `result_truncated`
    /// warning.
    #[must_use]
    pub fn with_result_set(mut self, result: &ResultSet, row_ceiling: usize) -> Self {
        let mut data = match self.data.take() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        data.insert("columns".to_string(), json!(result.columns));
        data.insert("rows".to_string(), Value::Array(result.json_rows()));
        self.data = Some(Value::Object(data));

        self = self
            .with_meta("row_count", json!(result.len()))
            .with_meta("truncated", json!(result.truncated))
            .with_meta("row_ceiling", json!(row_ceiling));
        if result.truncated {
            self = self
                .with_warning("result_truncated", "result cut at the store row ceiling")
                .with_warning_details(json!({ "row_ceiling": row_ceiling }));
        }
        self
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_warning(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.warnings.push(EnvelopeIssue::new(code, message));
        self
    }

    /// Attaches details to the most recently added warning.
    #[must_use]
    pub fn with_warning_details(mut self, details: Value) -> Self {
        if let Some(warning) = self.warnings.last_mut() {
            warning.details = Some(details);
        }
        self
    }

    #[must_use]
    pub fn with_error_details(mut self, details: Value) -> Self {
        if let Some(error) = &mut self.error {
            error.details = Some(details);
        }
        self
    }
}
