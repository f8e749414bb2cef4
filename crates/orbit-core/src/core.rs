use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::gemini::GeminiClient;
use crate::handler::{chat_handler, debug_env_handler};
use crate::resolver::ConfigResolver;

pub struct CoreState {
    pub resolver: Arc<ConfigResolver>,
    pub gemini: Arc<GeminiClient>,
}

pub struct Core {
    state: Arc<CoreState>,
    debug_routes: bool,
}

impl Core {
    pub fn new(resolver: Arc<ConfigResolver>, gemini: Arc<GeminiClient>) -> Self {
        Self {
            state: Arc::new(CoreState { resolver, gemini }),
            debug_routes: false,
        }
    }

    /// Mounts `GET /api/debug-env`, which reports a masked view of the key.
    pub fn with_debug_routes(mut self, enabled: bool) -> Self {
        self.debug_routes = enabled;
        self
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new().route("/api/chat", post(chat_handler));
        if self.debug_routes {
            router = router.route("/api/debug-env", get(debug_env_handler));
        }
        router.with_state(self.state.clone())
    }

    pub fn state(&self) -> Arc<CoreState> {
        self.state.clone()
    }
}
