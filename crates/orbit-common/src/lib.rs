mod config;
mod payload;
mod resolution;

pub use config::{
    GenerationConfig, GenerationConfigError, GenerationTarget, mask_secret,
    normalize_system_prompt,
};
pub use payload::{SecretPayload, StructuredKeys};
pub use resolution::{ConfigResolution, ConfigSources, SourceError};
