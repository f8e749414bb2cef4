use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use orbit_core::resolver::{ResolverConfig, SecretIds, process_env};
use orbit_core::{
    ConfigResolver, Core, GeminiClient, GeminiClientConfig, TtlConfigCache, UpstreamClientConfig,
    WreqUpstreamClient,
};
use orbit_secrets::{AwsSecretStore, SecretStore};
use tracing::info;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("orbit failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env = process_env();

    let lookups = cli.secrets.enabled(|name| env(name));
    let store: Option<Arc<dyn SecretStore>> = if lookups {
        let store = AwsSecretStore::connect(&cli.region()).await;
        info!(region = %store.region(), "secret store ready");
        Some(Arc::new(store))
    } else {
        None
    };
    info!(
        mode = %cli.secrets,
        secret_lookups = lookups,
        secret_json = %cli.secret_name_json,
        secret_plain = %cli.secret_name_api_key,
        "secret lookups configured"
    );

    let upstream = WreqUpstreamClient::new(UpstreamClientConfig {
        proxy: cli.proxy.clone(),
        ..UpstreamClientConfig::default()
    })
    .context("build upstream http client")?;
    let gemini = GeminiClient::new(
        Arc::new(upstream),
        GeminiClientConfig {
            base_url: cli.gemini_base_url.clone(),
            default_model: cli.default_model.clone(),
            deadline: Duration::from_secs(cli.upstream_timeout_secs),
        },
    );
    let resolver = ConfigResolver::new(
        store,
        env,
        Arc::new(TtlConfigCache::new()),
        ResolverConfig {
            secret_ids: SecretIds {
                json: cli.secret_name_json.clone(),
                plain: cli.secret_name_api_key.clone(),
            },
            ttl: Duration::from_secs(cli.config_ttl_secs),
        },
    );

    let core = Core::new(Arc::new(resolver), Arc::new(gemini)).with_debug_routes(cli.debug_routes);
    info!(
        default_model = %cli.default_model,
        upstream_timeout_secs = cli.upstream_timeout_secs,
        config_ttl_secs = cli.config_ttl_secs,
        debug_routes = cli.debug_routes,
        proxy = %cli.proxy.as_deref().unwrap_or(""),
        "config loaded"
    );

    serve(core.router(), &cli.bind_addr()).await
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("orbit=info,orbit_core=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(app: axum::Router, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(addr = %addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
