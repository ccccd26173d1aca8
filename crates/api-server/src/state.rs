//! Application state

use std::sync::Arc;

use agent_loop::AgentRunner;
use sitesmith_core::config::Config;
use sitesmith_core::model::GeminiClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    runner: Arc<AgentRunner>,
}

impl AppState {
    /// Create a new AppState from the service configuration
    pub fn new(config: Config) -> Self {
        let model = Arc::new(GeminiClient::new(
            config.model.clone(),
            config.api_key.clone(),
        ));
        let runner = Arc::new(AgentRunner::new(model, &config));

        Self {
            inner: Arc::new(AppStateInner { config, runner }),
        }
    }

    /// Get the service configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the shared runner
    pub fn runner(&self) -> Arc<AgentRunner> {
        Arc::clone(&self.inner.runner)
    }
}
