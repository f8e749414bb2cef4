use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use orbit_common::{ConfigResolution, ConfigSources, SourceError};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::core::CoreState;
use crate::error::ChatError;
use crate::gemini::excerpt;

/// Longer messages are cut, not rejected.
pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const REQUEST_ID_HEADER: &str = "x-orbit-request-id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    pub used_system_prompt: bool,
}

pub async fn chat_handler(State(state): State<Arc<CoreState>>, body: Bytes) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let span = info_span!("chat", trace_id = %trace_id);
    let started_at = Instant::now();

    let outcome = AssertUnwindSafe(handle_chat(&state, body))
        .catch_unwind()
        .instrument(span.clone())
        .await;
    let result = outcome
        .unwrap_or_else(|panic| Err(ChatError::Uncaught(panic_message(panic.as_ref()))));

    let mut response = span.in_scope(|| match result {
        Ok(reply) => {
            info!(
                event = "chat_responded",
                status = StatusCode::OK.as_u16(),
                used_system_prompt = reply.used_system_prompt,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            (StatusCode::OK, Json(reply)).into_response()
        }
        Err(err) => {
            warn!(
                event = "chat_responded",
                status = err.status().as_u16(),
                code = err.code().as_str(),
                error = %err,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            err.into_response()
        }
    });
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// received -> config resolved -> validated -> upstream called [-> retried] -> responded
async fn handle_chat(state: &CoreState, body: Bytes) -> Result<ChatReply, ChatError> {
    let resolution = state.resolver.resolve().await;
    if !resolution.has_api_key() {
        return Err(ChatError::ApiKeyNotFound {
            details: missing_key_details(&resolution, state.resolver.secret_lookups_enabled()),
        });
    }

    let payload = parse_body(&body);
    let message = extract_message(&payload);
    if message.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    info!(
        event = "chat_received",
        chars = message.chars().count(),
        has_system_prompt = resolution.config.has_system_prompt()
    );

    let reply = state.gemini.generate(&message, &resolution.config).await?;
    Ok(ChatReply {
        reply: reply.text,
        used_system_prompt: reply.used_system_prompt,
    })
}

/// Malformed, absent or non-object bodies read as `{}`.
fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice::<Value>(body)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Map::new()))
}

fn extract_message(payload: &Value) -> String {
    let text = match payload.get("message") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(number)) if number.as_f64() == Some(0.0) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };
    excerpt(&text, MAX_MESSAGE_CHARS)
}

fn missing_key_details(resolution: &ConfigResolution, secret_lookups: bool) -> Value {
    json!({
        "secretLookups": secret_lookups,
        "attempted": resolution.attempted,
        "source": resolution.source,
        "errors": resolution.errors,
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugEnvReport {
    pub gemini_key_present: bool,
    pub gemini_key_length: usize,
    pub gemini_key_masked: Option<String>,
    pub model: String,
    pub system_prompt_present: bool,
    pub secret_lookups: bool,
    pub source: ConfigSources,
    pub errors: Vec<SourceError>,
    pub attempted: Vec<String>,
}

pub async fn debug_env_handler(State(state): State<Arc<CoreState>>) -> Json<DebugEnvReport> {
    let resolution = state.resolver.resolve().await;
    Json(DebugEnvReport {
        gemini_key_present: resolution.has_api_key(),
        gemini_key_length: resolution.key_len(),
        gemini_key_masked: resolution.masked_key(),
        model: resolution
            .config
            .model
            .clone()
            .unwrap_or_else(|| state.gemini.config().default_model.clone()),
        system_prompt_present: resolution.config.has_system_prompt(),
        secret_lookups: state.resolver.secret_lookups_enabled(),
        source: resolution.source,
        errors: resolution.errors.clone(),
        attempted: resolution.attempted.clone(),
    })
}
