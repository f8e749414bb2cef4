//! Layered lookup of the generation API key, model and system prompt.
//!
//! Layers, highest precedence first: the structured (JSON) secret, the plain
//! secret, then process environment. Each field falls through the chain on
//! its own. A failing secret fetch is recorded and skipped, never fatal.

mod cache;

use std::sync::Arc;
use std::time::Duration;

use orbit_common::{
    ConfigResolution, ConfigSources, GenerationConfig, SecretPayload, SourceError,
    normalize_system_prompt,
};
use orbit_secrets::{SecretError, SecretStore};
use tracing::{info, warn};

pub use cache::{CachedConfig, ConfigCache, TtlConfigCache};

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "NEXT_PUBLIC_GEMINI_MODEL";
pub const ENV_SYSTEM_PROMPT: &str = "GEMINI_SYSTEM_PROMPT";

pub const DEFAULT_SECRET_JSON: &str = "amplify/gemini/config";
pub const DEFAULT_SECRET_PLAIN: &str = "amplify/gemini/apiKey";
pub const DEFAULT_CONFIG_TTL: Duration = Duration::from_secs(5 * 60);

const ENV_SOURCE_ID: &str = "env";

pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub fn process_env() -> EnvLookup {
    Arc::new(|name| std::env::var(name).ok())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretIds {
    /// Structured secret: a JSON object with named fields.
    pub json: String,
    /// Plain secret: the API key itself.
    pub plain: String,
}

impl Default for SecretIds {
    fn default() -> Self {
        Self {
            json: DEFAULT_SECRET_JSON.to_string(),
            plain: DEFAULT_SECRET_PLAIN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub secret_ids: SecretIds,
    pub ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            secret_ids: SecretIds::default(),
            ttl: DEFAULT_CONFIG_TTL,
        }
    }
}

pub struct ConfigResolver {
    /// `None` when secret lookups are disabled for this deployment.
    store: Option<Arc<dyn SecretStore>>,
    env: EnvLookup,
    cache: Arc<dyn ConfigCache>,
    config: ResolverConfig,
}

impl ConfigResolver {
    pub fn new(
        store: Option<Arc<dyn SecretStore>>,
        env: EnvLookup,
        cache: Arc<dyn ConfigCache>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            store,
            env,
            cache,
            config,
        }
    }

    pub fn secret_lookups_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Cached result while fresh, otherwise a full reload from every layer.
    ///
    /// Never fails: a missing API key is reported through the result and
    /// left for the caller to judge.
    pub async fn resolve(&self) -> Arc<ConfigResolution> {
        if let Some(hit) = self.cache.get() {
            return hit;
        }
        let resolution = Arc::new(self.load().await);
        self.cache.set(resolution.clone(), self.config.ttl);
        resolution
    }

    async fn load(&self) -> ConfigResolution {
        let mut attempted = Vec::new();
        let mut errors = Vec::new();
        let (json_layer, plain_layer) = match &self.store {
            Some(store) => {
                // Sequential: structured first, then plain.
                let ids = &self.config.secret_ids;
                let outcomes = [
                    (ids.json.as_str(), fetch_layer(store.as_ref(), &ids.json).await),
                    (ids.plain.as_str(), fetch_layer(store.as_ref(), &ids.plain).await),
                ];
                let [json, plain] = outcomes.map(|(secret_id, outcome)| {
                    let source_id = format!("secret:{secret_id}");
                    attempted.push(source_id.clone());
                    outcome.unwrap_or_else(|err| {
                        warn!(
                            event = "secret_fetch_failed",
                            source_id = %source_id,
                            error = %err.detail()
                        );
                        errors.push(SourceError {
                            source_id,
                            message: err.detail().to_string(),
                        });
                        GenerationConfig::default()
                    })
                });
                (json, plain)
            }
            None => (GenerationConfig::default(), GenerationConfig::default()),
        };

        attempted.push(ENV_SOURCE_ID.to_string());
        let env_layer = self.env_layer();

        let source = ConfigSources {
            secret_json: !json_layer.is_empty(),
            secret_plain: !plain_layer.is_empty(),
            env: !env_layer.is_empty(),
        };
        let config = GenerationConfig::merged([env_layer, plain_layer, json_layer]);

        info!(
            event = "config_resolved",
            secret_lookups = self.store.is_some(),
            secret_json = source.secret_json,
            secret_plain = source.secret_plain,
            env = source.env,
            has_api_key = config.api_key.is_some(),
            model = ?config.model,
            has_system_prompt = config.system_prompt.is_some(),
            errors = errors.len()
        );

        ConfigResolution {
            config,
            source,
            errors,
            attempted,
        }
    }

    fn env_layer(&self) -> GenerationConfig {
        GenerationConfig::new(
            (self.env)(ENV_API_KEY),
            (self.env)(ENV_MODEL),
            (self.env)(ENV_SYSTEM_PROMPT).and_then(|raw| normalize_system_prompt(&raw)),
        )
    }
}

async fn fetch_layer(
    store: &dyn SecretStore,
    secret_id: &str,
) -> Result<GenerationConfig, SecretError> {
    let raw = store.get_secret_string(secret_id).await?;
    Ok(raw
        .map(|raw| SecretPayload::parse(&raw).into_config())
        .unwrap_or_default())
}
