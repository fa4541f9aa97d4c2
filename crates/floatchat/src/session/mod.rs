//! One user's conversation: the transcript plus the latest result set.
//!
//! `handle_turn` takes `&mut self`, so a session can never run two turns at
//! once. Sessions share nothing with each other.

use tracing::{debug, info, warn};

use crate::models::{ResultSet, TranscriptEntry, TranslationResult, TurnPhase};
use crate::policy::{PolicyViolation, validate_statement};
use crate::store::{QueryExecutionError, QueryStore};
use crate::translator::Translator;

pub const GREETING: &str = "🌊 Hello! I'm your ocean data assistant. Try asking: 'Show me the warmest surface waters' or 'Find floats near the equator'.";

pub const SUCCESS_MARKER: &str = "✅";
pub const FAILURE_MARKER: &str = "❌";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnFailure {
    #[error("{reason}")]
    Translation { reason: String },

    #[error("Query rejected: {0}")]
    Policy(#[from] PolicyViolation),

    #[error("{0}")]
    Execution(#[from] QueryExecutionError),
}

impl TurnFailure {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Translation { .. } => "translation_failed",
            Self::Policy(violation) => violation.code(),
            Self::Execution(_) => "query_execution_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Blank input; nothing was recorded.
    Skipped,
    Rows {
        sql_text: String,
        row_count: usize,
        truncated: bool,
    },
    Answer {
        text: String,
    },
    Failed {
        sql_text: Option<String>,
        failure: TurnFailure,
    },
}

#[derive(Debug, Clone)]
pub struct Session {
    transcript: Vec<TranscriptEntry>,
    result: Option<ResultSet>,
    last_query: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            transcript: vec![TranscriptEntry::assistant(GREETING)],
            result: None,
            last_query: None,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    #[must_use]
    pub fn result(&self) -> Option<&ResultSet> {
        self.result.as_ref()
    }

    /// Statement that produced the current result set.
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Drops the current result set. The transcript is untouched.
    pub fn clear_results(&mut self) {
        self.result = None;
        self.last_query = None;
    }

    pub fn handle_turn(
        &mut self,
        question: &str,
        translator: &Translator,
        store: &dyn QueryStore,
    ) -> TurnOutcome {
        if question.trim().is_empty() {
            return TurnOutcome::Skipped;
        }
        self.transcript.push(TranscriptEntry::user(question));

        let (translation, phase) = translator.translate(question);
        info!(
            phase = phase.as_str(),
            kind = translation.kind(),
            "turn translated"
        );

        let outcome = match translation {
            TranslationResult::Query { sql_text } => match run_statement(&sql_text, store) {
                Ok(result) => {
                    let row_count = result.len();
                    let truncated = result.truncated;
                    self.transcript.push(TranscriptEntry::assistant(format!(
                        "{SUCCESS_MARKER} Found {row_count} records!\n\n```sql\n{sql_text}\n```"
                    )));
                    self.result = Some(result);
                    self.last_query = Some(sql_text.clone());
                    TurnOutcome::Rows {
                        sql_text,
                        row_count,
                        truncated,
                    }
                }
                Err(failure) => self.fail(Some(sql_text), failure),
            },
            TranslationResult::Answer { text } => {
                self.transcript.push(TranscriptEntry::assistant(text.clone()));
                TurnOutcome::Answer { text }
            }
            TranslationResult::Failure { reason } => {
                self.fail(None, TurnFailure::Translation { reason })
            }
        };
        debug!(
            phase = TurnPhase::Idle.as_str(),
            transcript_len = self.transcript.len(),
            "turn complete"
        );
        outcome
    }

    fn fail(&mut self, sql_text: Option<String>, failure: TurnFailure) -> TurnOutcome {
        warn!(code = failure.code(), "turn failed");
        self.transcript
            .push(TranscriptEntry::assistant(format!("{FAILURE_MARKER} {failure}")));
        TurnOutcome::Failed { sql_text, failure }
    }
}

/// Policy check, then execution. Nothing reaches the store unvalidated.
pub fn run_statement(sql_text: &str, store: &dyn QueryStore) -> Result<ResultSet, TurnFailure> {
    let validated = validate_statement(sql_text)?;
    Ok(store.execute(validated.statement())?)
}
