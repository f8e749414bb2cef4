use serde_json::{Map, Value};

use crate::config::GenerationConfig;

/// Canonical and alternate key names looked up inside a structured secret.
#[derive(Debug, Clone, Copy)]
pub struct StructuredKeys {
    pub api_key: [&'static str; 2],
    pub model: [&'static str; 2],
    pub system_prompt: [&'static str; 2],
}

impl StructuredKeys {
    pub const DEFAULT: StructuredKeys = StructuredKeys {
        api_key: ["GEMINI_API_KEY", "apiKey"],
        model: ["NEXT_PUBLIC_GEMINI_MODEL", "model"],
        system_prompt: ["GEMINI_SYSTEM_PROMPT", "systemPrompt"],
    };
}

/// A fetched secret string, classified by a single JSON parse attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SecretPayload {
    /// The secret parsed as a JSON object.
    Structured(Map<String, Value>),
    /// Anything else; the whole string is the API key.
    Plain(String),
}

impl SecretPayload {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => SecretPayload::Structured(map),
            _ => SecretPayload::Plain(raw.to_string()),
        }
    }

    pub fn into_config(self) -> GenerationConfig {
        self.into_config_with(&StructuredKeys::DEFAULT)
    }

    pub fn into_config_with(self, keys: &StructuredKeys) -> GenerationConfig {
        match self {
            SecretPayload::Structured(map) => GenerationConfig::new(
                pick(&map, &keys.api_key),
                pick(&map, &keys.model),
                pick(&map, &keys.system_prompt),
            ),
            SecretPayload::Plain(raw) => GenerationConfig::new(Some(raw), None, None),
        }
    }
}

/// First candidate key holding a non-blank string wins.
fn pick(map: &Map<String, Value>, candidates: &[&'static str]) -> Option<String> {
    candidates.iter().find_map(|key| {
        map.get(*key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
    })
}
