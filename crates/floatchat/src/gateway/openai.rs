use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GatewayError, LanguageModelGateway};
use crate::config::GatewayConfig;
use crate::models::TranslationRequest;
use crate::utils::redaction::sanitize_error_text;

const ERROR_BODY_MAX_CHARS: usize = 300;

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug)]
pub struct OpenAiGateway {
    config: GatewayConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl OpenAiGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("floatchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build language model HTTP client")?;
        Ok(Self { config, client })
    }

    fn classify_transport_error(&self, error: &reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            GatewayError::Timeout {
                after_secs: self.config.timeout.as_secs(),
            }
        } else {
            GatewayError::Unreachable {
                detail: sanitize_error_text(&error.to_string()),
            }
        }
    }
}

impl LanguageModelGateway for OpenAiGateway {
    fn complete(&self, request: &TranslationRequest) -> Result<String, GatewayError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(GatewayError::MissingApiKey);
        };

        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system_instructions,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_question,
                },
            ],
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
        };

        debug!(
            model = %self.config.model,
            question_chars = request.user_question.chars().count(),
            "sending chat completion request"
        );
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .map_err(|error| self.classify_transport_error(&error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let error = classify_http_failure(status, &body);
            warn!(status = status.as_u16(), code = error.code(), "chat completion rejected");
            return Err(error);
        }

        let body = response
            .text()
            .map_err(|error| self.classify_transport_error(&error))?;
        parse_completion_body(&body)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn parse_completion_body(body: &str) -> Result<String, GatewayError> {
    let decoded = serde_json::from_str::<ChatCompletionResponse>(body).map_err(|error| {
        GatewayError::MalformedResponse {
            detail: error.to_string(),
        }
    })?;

    decoded
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GatewayError::MalformedResponse {
            detail: "response contained no message content".to_string(),
        })
}

fn classify_http_failure(status: StatusCode, body: &str) -> GatewayError {
    let api_error = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);
    let detail = api_error
        .as_ref()
        .and_then(|error| error.message.clone())
        .unwrap_or_else(|| body.to_string());
    let detail = sanitize_error_text(&truncate_chars(detail.trim(), ERROR_BODY_MAX_CHARS));
    let quota_code = api_error.as_ref().is_some_and(|error| {
        [error.code.as_deref(), error.kind.as_deref()]
            .into_iter()
            .flatten()
            .any(|code| code == "insufficient_quota")
    });

    match status.as_u16() {
        401 | 403 => GatewayError::AuthenticationRejected {
            status: status.as_u16(),
            detail,
        },
        429 => GatewayError::QuotaExceeded {
            status: status.as_u16(),
            detail,
        },
        _ if quota_code => GatewayError::QuotaExceeded {
            status: status.as_u16(),
            detail,
        },
        500..=599 => GatewayError::Unreachable {
            detail: format!("HTTP {}: {detail}", status.as_u16()),
        },
        _ => GatewayError::Rejected {
            status: status.as_u16(),
            detail,
        },
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{GatewayError, classify_http_failure, parse_completion_body};

    #[test]
    fn decodes_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"```sql\nSELECT 1;\n```"}}]}"#;
        assert_eq!(
            parse_completion_body(body).expect("body should decode"),
            "```sql\nSELECT 1;\n```"
        );
    }

    #[test]
    fn empty_choices_are_malformed() {
        let error = parse_completion_body(r#"{"choices":[]}"#).expect_err("no choices");
        assert_eq!(error.code(), "gateway_malformed_response");

        let error = parse_completion_body("<html>").expect_err("not json");
        assert_eq!(error.code(), "gateway_malformed_response");
    }

    #[test]
    fn classifies_authentication_failures() {
        let body = r#"{"error":{"message":"Incorrect API key provided: sk-abcdefghijklmnop","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let error = classify_http_failure(StatusCode::UNAUTHORIZED, body);
        match error {
            GatewayError::AuthenticationRejected { status, detail } => {
                assert_eq!(status, 401);
                assert!(detail.contains("Incorrect API key provided"));
                assert!(!detail.contains("sk-abcdefghijklmnop"));
            }
            other => panic!("expected authentication failure, got {other:?}"),
        }
    }

    #[test]
    fn classifies_quota_failures_by_status_and_code() {
        let error = classify_http_failure(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(error.code(), "gateway_quota_exceeded");

        let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#;
        let error = classify_http_failure(StatusCode::BAD_REQUEST, body);
        assert_eq!(error.code(), "gateway_quota_exceeded");
    }

    #[test]
    fn server_errors_count_as_unreachable() {
        let error = classify_http_failure(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(error.is_transient());
        assert_eq!(error.code(), "gateway_unreachable");

        let error = classify_http_failure(StatusCode::BAD_REQUEST, "bad payload");
        assert_eq!(error.code(), "gateway_rejected");
    }
}
