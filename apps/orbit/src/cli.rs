use clap::Parser;
use orbit_core::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use orbit_core::resolver::{DEFAULT_SECRET_JSON, DEFAULT_SECRET_PLAIN};
use orbit_secrets::{DEFAULT_REGION, SecretLookupMode};

#[derive(Parser, Debug)]
#[command(name = "orbit", about = "Chat backend for the portfolio site")]
pub(crate) struct Cli {
    #[arg(long, env = "ORBIT_HOST", default_value = "127.0.0.1")]
    pub(crate) host: String,
    #[arg(long, env = "ORBIT_PORT", default_value_t = 3000)]
    pub(crate) port: u16,
    /// Outbound proxy for upstream calls.
    #[arg(long, env = "ORBIT_PROXY")]
    pub(crate) proxy: Option<String>,
    /// auto: only when a cloud execution marker is present.
    #[arg(long, env = "ORBIT_SECRETS", default_value_t = SecretLookupMode::Auto)]
    pub(crate) secrets: SecretLookupMode,
    #[arg(long, env = "SECRET_NAME_GEMINI_JSON", default_value = DEFAULT_SECRET_JSON)]
    pub(crate) secret_name_json: String,
    #[arg(long, env = "SECRET_NAME_GEMINI_API_KEY", default_value = DEFAULT_SECRET_PLAIN)]
    pub(crate) secret_name_api_key: String,
    /// Falls back to AWS_DEFAULT_REGION, then us-east-1.
    #[arg(long, env = "AWS_REGION")]
    pub(crate) aws_region: Option<String>,
    #[arg(long, env = "ORBIT_DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    pub(crate) default_model: String,
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub(crate) gemini_base_url: String,
    #[arg(long, env = "ORBIT_UPSTREAM_TIMEOUT_SECS", default_value_t = 25)]
    pub(crate) upstream_timeout_secs: u64,
    #[arg(long, env = "ORBIT_CONFIG_TTL_SECS", default_value_t = 300)]
    pub(crate) config_ttl_secs: u64,
    /// Mounts GET /api/debug-env.
    #[arg(long, env = "ORBIT_DEBUG_ROUTES")]
    pub(crate) debug_routes: bool,
}

impl Cli {
    pub(crate) fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn region(&self) -> String {
        self.aws_region
            .clone()
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
            .map(|region| region.trim().to_string())
            .filter(|region| !region.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }
}
