use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::{SecretError, SecretStore};

#[derive(Debug, Clone)]
enum Entry {
    Value(Option<String>),
    Failure(String),
}

/// In-process store; counts fetches so callers can assert on cache behavior.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    fetches: Arc<AtomicUsize>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, secret_id: &str, value: &str) -> Self {
        self.set(secret_id, Some(value));
        self
    }

    pub fn with_failure(self, secret_id: &str, message: &str) -> Self {
        self.fail(secret_id, message);
        self
    }

    /// `None` models a secret that exists without a string value.
    pub fn set(&self, secret_id: &str, value: Option<&str>) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(
                secret_id.to_string(),
                Entry::Value(value.map(str::to_string)),
            );
        }
    }

    pub fn fail(&self, secret_id: &str, message: &str) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(secret_id.to_string(), Entry::Failure(message.to_string()));
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret_string(&self, secret_id: &str) -> Result<Option<String>, SecretError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let guard = self
            .entries
            .read()
            .map_err(|_| SecretError::Unavailable("memory store lock poisoned".to_string()))?;
        match guard.get(secret_id) {
            Some(Entry::Value(value)) => Ok(value.clone()),
            Some(Entry::Failure(message)) => Err(SecretError::fetch(secret_id, message.clone())),
            None => Err(SecretError::fetch(secret_id, "ResourceNotFoundException")),
        }
    }
}
