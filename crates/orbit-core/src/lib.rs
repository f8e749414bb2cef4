pub mod core;
pub mod error;
pub mod gemini;
pub mod handler;
pub mod resolver;
pub mod upstream_client;

pub use core::{Core, CoreState};
pub use error::{ChatError, ErrorCode};
pub use gemini::{GeminiClient, GeminiClientConfig, GenerateError, GenerateReply};
pub use resolver::{
    CachedConfig, ConfigCache, ConfigResolver, EnvLookup, ResolverConfig, SecretIds,
    TtlConfigCache,
};
pub use upstream_client::{
    UpstreamClient, UpstreamClientConfig, UpstreamFailure, UpstreamHttpRequest,
    UpstreamHttpResponse, UpstreamTransportErrorKind, WreqUpstreamClient,
};
