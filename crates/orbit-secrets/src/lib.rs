//! Secret stores consulted by the config resolver.
//!
//! The resolver only sees the [`SecretStore`] trait; the AWS client is built
//! once at startup and only when secret lookups are enabled.

mod aws;
mod error;
mod gate;
#[cfg(any(test, feature = "test-utils"))]
mod memory;

use async_trait::async_trait;

pub use aws::{AwsSecretStore, DEFAULT_REGION};
pub use error::SecretError;
pub use gate::{CLOUD_MARKERS, SecretLookupMode};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemorySecretStore;

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` when the secret exists but carries no string value.
    async fn get_secret_string(&self, secret_id: &str) -> Result<Option<String>, SecretError>;
}
