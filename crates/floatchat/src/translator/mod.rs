//! Question to SQL translation.
//!
//! A turn runs `compose_request` -> `invoke` -> `extract_query`. The
//! translator never opens the query store and keeps no state between turns;
//! whatever statement it extracts is handed back to the caller unvalidated.

mod prompt;

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

pub use prompt::SYSTEM_INSTRUCTIONS;

use crate::gateway::{LanguageModelGateway, ModelReply};
use crate::models::{TranslationRequest, TranslationResult, TurnPhase};

pub struct Translator {
    gateway: Box<dyn LanguageModelGateway>,
    max_retries: u32,
}

impl Translator {
    #[must_use]
    pub fn new(gateway: Box<dyn LanguageModelGateway>) -> Self {
        Self {
            gateway,
            max_retries: 0,
        }
    }

    /// Allows up to `max_retries` extra gateway attempts after transport failures.
    /// Retrying is safe because nothing executes until a reply is extracted.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        self.gateway.model_name()
    }

    #[must_use]
    pub fn compose_request(question: &str) -> TranslationRequest {
        TranslationRequest {
            system_instructions: SYSTEM_INSTRUCTIONS,
            user_question: question.to_string(),
        }
    }

    pub fn invoke(&self, request: &TranslationRequest) -> ModelReply {
        let mut attempt = 0_u32;
        loop {
            match self.gateway.complete(request) {
                Ok(text) => {
                    debug!(attempt, reply_chars = text.chars().count(), "model replied");
                    return ModelReply::Text(text);
                }
                Err(error) if error.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, code = error.code(), "retrying language model call");
                }
                Err(error) => {
                    warn!(attempt, code = error.code(), "language model call failed");
                    return ModelReply::Failed(error);
                }
            }
        }
    }

    /// Runs one full translation and reports the phase it ended in.
    pub fn translate(&self, question: &str) -> (TranslationResult, TurnPhase) {
        let request = Self::compose_request(question);
        debug!(phase = TurnPhase::AwaitingModel.as_str(), "translation started");
        let reply = self.invoke(&request);
        let result = extract_query(&reply);
        let phase = TurnPhase::after(&result);
        info!(
            model = self.model_name(),
            phase = phase.as_str(),
            "translation finished"
        );
        (result, phase)
    }
}

/// Classifies a gateway reply. Pure: the same reply always yields the same result.
#[must_use]
pub fn extract_query(reply: &ModelReply) -> TranslationResult {
    match reply {
        ModelReply::Failed(error) => TranslationResult::Failure {
            reason: error.to_string(),
        },
        ModelReply::Text(raw_text) => extract_from_text(raw_text),
    }
}

/// Finds a statement in free-form model text.
///
/// The first ```` ```sql ```` fenced block decides: its trimmed content is
/// the statement, and a blank block makes the whole reply an answer. Without
/// a fenced block, the first `SELECT ... ;` anywhere in the text
/// (case-insensitive, may span lines) is taken verbatim. That fallback also
/// fires on prose mentioning "select" before a semicolon; this imprecision is
/// accepted. Text with neither shape is the model answering directly.
#[must_use]
pub fn extract_from_text(raw_text: &str) -> TranslationResult {
    if let Some(captures) = fenced_sql_regex().captures(raw_text) {
        let statement = captures.get(1).map_or("", |content| content.as_str().trim());
        if statement.is_empty() {
            return TranslationResult::Answer {
                text: raw_text.to_string(),
            };
        }
        return TranslationResult::Query {
            sql_text: statement.to_string(),
        };
    }

    if let Some(found) = bare_select_regex().find(raw_text) {
        return TranslationResult::Query {
            sql_text: found.as_str().trim().to_string(),
        };
    }

    TranslationResult::Answer {
        text: raw_text.to_string(),
    }
}

fn fenced_sql_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?s)```sql[ \t]*\r?\n(?:(.*?)\r?\n)??[ \t]*```")
            .expect("fenced sql regex should compile")
    })
}

fn bare_select_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?is)SELECT.*?;").expect("bare select regex should compile")
    })
}
