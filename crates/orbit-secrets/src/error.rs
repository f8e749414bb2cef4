#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("could not read secret {secret_id}: {message}")]
    Fetch { secret_id: String, message: String },
    #[error("secret store unavailable: {0}")]
    Unavailable(String),
}

impl SecretError {
    /// Message without the secret id prefix, for per-source diagnostics.
    pub fn detail(&self) -> &str {
        match self {
            SecretError::Fetch { message, .. } => message,
            SecretError::Unavailable(message) => message,
        }
    }

    pub fn fetch(secret_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            secret_id: secret_id.into(),
            message: message.into(),
        }
    }
}
