use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata};
use tracing::debug;

use crate::{SecretError, SecretStore};

pub const DEFAULT_REGION: &str = "us-east-1";
const VERSION_STAGE: &str = "AWSCURRENT";

/// AWS Secrets Manager, reading the `AWSCURRENT` version of each secret.
#[derive(Debug, Clone)]
pub struct AwsSecretStore {
    client: Client,
    region: String,
}

impl AwsSecretStore {
    pub async fn connect(region: &str) -> Self {
        let region = if region.trim().is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            region.trim().to_string()
        };
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        Self {
            client: Client::new(&sdk_config),
            region,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn get_secret_string(&self, secret_id: &str) -> Result<Option<String>, SecretError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .version_stage(VERSION_STAGE)
            .send()
            .await
            .map_err(|err| {
                // Error code when the service returned one, e.g. ResourceNotFoundException.
                let message = err
                    .code()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
                SecretError::fetch(secret_id, message)
            })?;
        debug!(
            event = "secret_fetched",
            secret_id = %secret_id,
            region = %self.region,
            has_string = output.secret_string().is_some()
        );
        Ok(output.secret_string().map(str::to_string))
    }
}
