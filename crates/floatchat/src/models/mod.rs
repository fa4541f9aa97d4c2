pub mod argo;
pub mod query_envelope;
pub mod result_set;
pub mod transcript;
pub mod translation;

pub use argo::{ARGO_COLUMNS, ARGO_TABLE, MeasurementRecord, is_argo_column, json_schema};
pub use query_envelope::{
    EnvelopeIssue, QUERY_ENVELOPE_SCHEMA_VERSION, QueryEnvelope, QueryEnvelopeCommandFailure,
};
pub use result_set::{Cell, ResultSet};
pub use transcript::{Role, TranscriptEntry};
pub use translation::{TranslationRequest, TranslationResult, TurnPhase};
