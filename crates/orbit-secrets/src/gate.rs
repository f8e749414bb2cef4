use std::fmt;
use std::str::FromStr;

/// Environment variables whose presence marks a cloud execution environment.
pub const CLOUD_MARKERS: [&str; 3] = [
    "AWS_EXECUTION_ENV",
    "AWS_LAMBDA_FUNCTION_NAME",
    "CODEBUILD_BUILD_ID",
];

/// Whether the secret store is consulted at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecretLookupMode {
    /// Only when a cloud execution marker is present.
    #[default]
    Auto,
    Always,
    Never,
}

impl SecretLookupMode {
    pub fn enabled<F>(self, env: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            SecretLookupMode::Always => true,
            SecretLookupMode::Never => false,
            SecretLookupMode::Auto => CLOUD_MARKERS
                .iter()
                .any(|name| env(name).is_some_and(|value| !value.trim().is_empty())),
        }
    }
}

impl FromStr for SecretLookupMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SecretLookupMode::Auto),
            "always" | "on" | "true" | "1" => Ok(SecretLookupMode::Always),
            "never" | "off" | "false" | "0" | "disabled" => Ok(SecretLookupMode::Never),
            other => Err(format!("invalid secret lookup mode: {other} (auto|always|never)")),
        }
    }
}

impl fmt::Display for SecretLookupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SecretLookupMode::Auto => "auto",
            SecretLookupMode::Always => "always",
            SecretLookupMode::Never => "never",
        };
        f.write_str(value)
    }
}
