#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use orbit_core::resolver::ResolverConfig;
use orbit_core::{
    ConfigResolver, Core, EnvLookup, GeminiClient, GeminiClientConfig, TtlConfigCache,
    UpstreamClient, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
    UpstreamTransportErrorKind,
};
use orbit_secrets::{MemorySecretStore, SecretStore};
use serde_json::Value;

pub const TEST_KEY: &str = "AIzaTestKey0000000001";
pub const TEST_BASE_URL: &str = "https://gemini.test/v1beta";

pub enum Scripted {
    Respond(u16, String),
    Fail(UpstreamTransportErrorKind, String),
    /// Never completes; only the caller's deadline ends it.
    Hang,
    /// Panics inside `send`.
    Panic(&'static str),
}

/// Plays back canned outcomes in order and records every request it saw.
#[derive(Default)]
pub struct ScriptedUpstream {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<UpstreamHttpRequest>>,
}

impl ScriptedUpstream {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<UpstreamHttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_bodies(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .map(|req| serde_json::from_slice(&req.body).unwrap())
            .collect()
    }
}

impl UpstreamClient for ScriptedUpstream {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>
    {
        Box::pin(async move {
            self.requests.lock().unwrap().push(req);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Scripted::Respond(status, body)) => Ok(UpstreamHttpResponse {
                    status,
                    body: Bytes::from(body),
                }),
                Some(Scripted::Fail(kind, message)) => Err(UpstreamFailure { kind, message }),
                Some(Scripted::Panic(message)) => panic!("{message}"),
                Some(Scripted::Hang) | None => std::future::pending().await,
            }
        })
    }
}

pub fn ok_text(text: &str) -> Scripted {
    let body = serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    });
    Scripted::Respond(200, body.to_string())
}

pub fn env_from(pairs: &[(&str, &str)]) -> EnvLookup {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    Arc::new(move |name| map.get(name).cloned())
}

pub fn resolver(store: Option<MemorySecretStore>, env: EnvLookup) -> ConfigResolver {
    ConfigResolver::new(
        store.map(|store| Arc::new(store) as Arc<dyn SecretStore>),
        env,
        Arc::new(TtlConfigCache::new()),
        ResolverConfig::default(),
    )
}

pub fn gemini(upstream: Arc<ScriptedUpstream>) -> GeminiClient {
    GeminiClient::new(
        upstream,
        GeminiClientConfig {
            base_url: TEST_BASE_URL.to_string(),
            default_model: "gemini-test".to_string(),
            deadline: Duration::from_secs(25),
        },
    )
}

pub fn core(env: EnvLookup, upstream: Arc<ScriptedUpstream>) -> Core {
    Core::new(Arc::new(resolver(None, env)), Arc::new(gemini(upstream)))
}
