//! Language model gateway: the one outbound network dependency of a turn.
//!
//! A gateway turns a [`TranslationRequest`] into free-form model text or a
//! typed [`GatewayError`]. Callers never see string-prefixed error markers;
//! failures travel as [`ModelReply::Failed`].

mod openai;

pub use openai::OpenAiGateway;

use crate::models::TranslationRequest;

/// Outcome of one gateway invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    Text(String),
    Failed(GatewayError),
}

impl From<Result<String, GatewayError>> for ModelReply {
    fn from(result: Result<String, GatewayError>) -> Self {
        match result {
            Ok(text) => Self::Text(text),
            Err(error) => Self::Failed(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("language model API key is not configured (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("language model gateway unreachable: {detail}")]
    Unreachable { detail: String },

    #[error("language model gateway timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    #[error("language model gateway rejected the credentials (HTTP {status}): {detail}")]
    AuthenticationRejected { status: u16, detail: String },

    #[error("language model quota exceeded (HTTP {status}): {detail}")]
    QuotaExceeded { status: u16, detail: String },

    #[error("language model gateway returned HTTP {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("language model response could not be decoded: {detail}")]
    MalformedResponse { detail: String },
}

impl GatewayError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "gateway_missing_api_key",
            Self::Unreachable { .. } => "gateway_unreachable",
            Self::Timeout { .. } => "gateway_timeout",
            Self::AuthenticationRejected { .. } => "gateway_authentication_rejected",
            Self::QuotaExceeded { .. } => "gateway_quota_exceeded",
            Self::Rejected { .. } => "gateway_rejected",
            Self::MalformedResponse { .. } => "gateway_malformed_response",
        }
    }

    /// Transport-level failures; the only ones a retry may repeat.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
    }
}

pub trait LanguageModelGateway {
    /// Sends one request. Implementations must return rather than panic on
    /// any transport or protocol failure.
    fn complete(&self, request: &TranslationRequest) -> Result<String, GatewayError>;

    fn model_name(&self) -> &str {
        "unknown"
    }
}

impl<T: LanguageModelGateway + ?Sized> LanguageModelGateway for Box<T> {
    fn complete(&self, request: &TranslationRequest) -> Result<String, GatewayError> {
        (**self).complete(request)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
