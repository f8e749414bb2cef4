//! Single-turn `generateContent` calls against the Gemini REST API.
//!
//! The primary request sends the system prompt as `systemInstruction`. Model
//! generations that reject that field answer 400 naming it; in that case the
//! call is retried once with the prompt injected as a leading user turn.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use orbit_common::{GenerationConfig, GenerationTarget};
use orbit_protocol::gemini::generate_content::{
    GenerateContentPath, GenerateContentRequest, GenerateContentRequestBody,
    GenerateContentResponse,
};
use tokio::time::{Instant, timeout};
use tracing::{info, warn};

use crate::upstream_client::{
    UpstreamClient, UpstreamHttpRequest, UpstreamHttpResponse, UpstreamTransportErrorKind,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-002";
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(25);
/// Upper bound on upstream error text echoed back to callers.
pub const ERROR_EXCERPT_CHARS: usize = 500;

const SYSTEM_INSTRUCTION_MARKER: &str = "systeminstruction";

#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub base_url: String,
    pub default_model: String,
    /// Applied to the primary call and to the fallback call alike.
    pub deadline: Duration,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            deadline: DEFAULT_DEADLINE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReply {
    pub text: String,
    pub used_system_prompt: bool,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("no api key configured")]
    MissingApiKey,
    #[error("upstream call exceeded {0:?}")]
    Timeout(Duration),
    #[error("upstream fetch failed: {message}")]
    Transport {
        kind: UpstreamTransportErrorKind,
        message: String,
    },
    /// Non-success status; `body` is already cut to [`ERROR_EXCERPT_CHARS`].
    #[error("upstream returned status {status}")]
    Upstream {
        status: u16,
        body: String,
        fallback: bool,
    },
    #[error("could not encode upstream request: {0}")]
    Encode(String),
    #[error("could not decode upstream response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Primary,
    Fallback,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempt::Primary => f.write_str("primary"),
            Attempt::Fallback => f.write_str("fallback"),
        }
    }
}

pub struct GeminiClient {
    upstream: Arc<dyn UpstreamClient>,
    config: GeminiClientConfig,
}

impl GeminiClient {
    pub fn new(upstream: Arc<dyn UpstreamClient>, config: GeminiClientConfig) -> Self {
        let config = GeminiClientConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };
        Self { upstream, config }
    }

    pub fn config(&self) -> &GeminiClientConfig {
        &self.config
    }

    /// `<base>/models/<model>:generateContent?key=<api key>`
    pub fn endpoint(&self, target: &GenerationTarget) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url,
            urlencoding::encode(&target.model),
            urlencoding::encode(&target.api_key)
        )
    }

    pub async fn generate(
        &self,
        message: &str,
        config: &GenerationConfig,
    ) -> Result<GenerateReply, GenerateError> {
        let target = config
            .to_target(&self.config.default_model)
            .map_err(|_| GenerateError::MissingApiKey)?;
        let url = self.endpoint(&target);
        let system_prompt = target.system_prompt.as_deref();

        let primary = GenerateContentRequest {
            path: GenerateContentPath {
                model: target.model.clone(),
            },
            body: GenerateContentRequestBody::primary(message, system_prompt),
        };
        let mut response = self.call(&url, &primary, Attempt::Primary).await?;
        let mut used_fallback = false;

        if response.status == 400
            && let Some(prompt) = system_prompt
            && rejects_system_instruction(&response.body)
        {
            warn!(
                event = "upstream_fallback",
                model = %target.model,
                status = response.status,
                reason = "system_instruction_rejected"
            );
            let fallback = GenerateContentRequest {
                path: primary.path.clone(),
                body: GenerateContentRequestBody::fallback(message, prompt),
            };
            response = self.call(&url, &fallback, Attempt::Fallback).await?;
            used_fallback = true;
        }

        if !response.is_success() {
            return Err(GenerateError::Upstream {
                status: response.status,
                body: excerpt(&response.body_text(), ERROR_EXCERPT_CHARS),
                fallback: used_fallback,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&response.body)
            .map_err(|err| GenerateError::Decode(err.to_string()))?;
        Ok(GenerateReply {
            text: parsed.reply_text(),
            used_system_prompt: system_prompt.is_some(),
            used_fallback,
        })
    }

    async fn call(
        &self,
        url: &str,
        request: &GenerateContentRequest,
        attempt: Attempt,
    ) -> Result<UpstreamHttpResponse, GenerateError> {
        let body = serde_json::to_vec(&request.body)
            .map_err(|err| GenerateError::Encode(err.to_string()))?;
        let req = UpstreamHttpRequest {
            url: url.to_string(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::from(body),
        };

        let started_at = Instant::now();
        info!(
            event = "upstream_request",
            model = %request.path.model,
            attempt = %attempt,
            turns = request.body.contents.len(),
            system_instruction = request.body.system_instruction.is_some()
        );

        // Dropping the send future on expiry aborts the in-flight request.
        let outcome = timeout(self.config.deadline, self.upstream.send(req)).await;
        let elapsed_ms = started_at.elapsed().as_millis();
        match outcome {
            Err(_) => {
                warn!(
                    event = "upstream_response",
                    attempt = %attempt,
                    status = "timeout",
                    elapsed_ms = elapsed_ms
                );
                Err(GenerateError::Timeout(self.config.deadline))
            }
            Ok(Err(failure)) => {
                warn!(
                    event = "upstream_response",
                    attempt = %attempt,
                    status = "error",
                    kind = ?failure.kind,
                    elapsed_ms = elapsed_ms,
                    error = %failure.message
                );
                if failure.kind.is_timeout() {
                    Err(GenerateError::Timeout(self.config.deadline))
                } else {
                    Err(GenerateError::Transport {
                        kind: failure.kind,
                        message: failure.message,
                    })
                }
            }
            Ok(Ok(response)) => {
                info!(
                    event = "upstream_response",
                    attempt = %attempt,
                    status = response.status,
                    elapsed_ms = elapsed_ms
                );
                Ok(response)
            }
        }
    }
}

fn rejects_system_instruction(body: &[u8]) -> bool {
    String::from_utf8_lossy(body)
        .to_ascii_lowercase()
        .contains(SYSTEM_INSTRUCTION_MARKER)
}

/// First `max_chars` characters, never splitting a code point.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
