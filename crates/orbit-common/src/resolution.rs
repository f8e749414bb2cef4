use serde::Serialize;

use crate::config::{GenerationConfig, mask_secret};

/// Which layers contributed at least one field to the merged config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSources {
    pub secret_json: bool,
    pub secret_plain: bool,
    pub env: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceError {
    pub source_id: String,
    pub message: String,
}

/// Merged config plus the diagnostics of how it was obtained.
///
/// Serializes without the API key; use [`ConfigResolution::masked_key`] when
/// a diagnostic surface needs to hint at it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResolution {
    #[serde(flatten)]
    pub config: GenerationConfig,
    pub source: ConfigSources,
    pub errors: Vec<SourceError>,
    /// Layers consulted, in order (`secret:<id>`, `env`).
    pub attempted: Vec<String>,
}

impl ConfigResolution {
    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn masked_key(&self) -> Option<String> {
        self.config.api_key.as_deref().map(mask_secret)
    }

    pub fn key_len(&self) -> usize {
        self.config
            .api_key
            .as_deref()
            .map(|key| key.chars().count())
            .unwrap_or(0)
    }
}
