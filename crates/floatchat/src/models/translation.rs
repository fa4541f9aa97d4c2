use serde::Serialize;

/// Prompt pair sent to the language model for a single turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRequest {
    pub system_instructions: &'static str,
    pub user_question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationResult {
    Query { sql_text: String },
    Answer { text: String },
    Failure { reason: String },
}

impl TranslationResult {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Query { .. } => "query",
            Self::Answer { .. } => "answer",
            Self::Failure { .. } => "failure",
        }
    }

    #[must_use]
    pub fn sql_text(&self) -> Option<&str> {
        match self {
            Self::Query { sql_text } => Some(sql_text),
            _ => None,
        }
    }
}

/// Where a turn is in its lifecycle. Nothing survives past `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    AwaitingModel,
    HaveQuery,
    HaveAnswer,
    Failed,
}

impl TurnPhase {
    #[must_use]
    pub const fn after(result: &TranslationResult) -> Self {
        match result {
            TranslationResult::Query { .. } => Self::HaveQuery,
            TranslationResult::Answer { .. } => Self::HaveAnswer,
            TranslationResult::Failure { .. } => Self::Failed,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingModel => "awaiting_model",
            Self::HaveQuery => "have_query",
            Self::HaveAnswer => "have_answer",
            Self::Failed => "failed",
        }
    }
}
