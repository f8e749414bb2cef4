use std::fmt;

use serde::Serialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GenerationConfigError {
    #[error("missing required generation config field: {0}")]
    MissingField(&'static str),
}

/// One layer of generation settings, or the merge of several.
///
/// Every field is optional; merging overlays layers field by field, so a
/// higher layer that lacks a field never hides a lower layer's value.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

impl GenerationConfig {
    /// Builds a layer, dropping blank values so they fall through.
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            api_key: non_blank(api_key),
            model: non_blank(model),
            system_prompt: non_blank(system_prompt),
        }
    }

    pub fn overlay(&mut self, other: GenerationConfig) {
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.system_prompt.is_some() {
            self.system_prompt = other.system_prompt;
        }
    }

    /// Merges layers listed from lowest to highest precedence.
    pub fn merged<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = GenerationConfig>,
    {
        let mut merged = Self::default();
        for layer in layers {
            merged.overlay(layer);
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.model.is_none() && self.system_prompt.is_none()
    }

    pub fn has_system_prompt(&self) -> bool {
        self.system_prompt.is_some()
    }

    pub fn to_target(&self, default_model: &str) -> Result<GenerationTarget, GenerationConfigError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or(GenerationConfigError::MissingField("api_key"))?;
        Ok(GenerationTarget {
            api_key,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            system_prompt: self.system_prompt.clone(),
        })
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

/// Everything a single upstream call needs, with the key guaranteed present.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationTarget {
    pub api_key: String,
    pub model: String,
    pub system_prompt: Option<String>,
}

impl fmt::Debug for GenerationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationTarget")
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

/// `abcd***wxyz`; values of eight chars or fewer are hidden entirely.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}

/// Trims, then strips one layer of wrapping double quotes (and trims again).
pub fn normalize_system_prompt(raw: &str) -> Option<String> {
    let mut value = raw.trim();
    if value.starts_with('"') && value.ends_with('"') {
        // A lone `"` opens and closes at once and leaves nothing.
        value = value.get(1..value.len() - 1).unwrap_or_default().trim();
    }
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|item| !item.trim().is_empty())
}
