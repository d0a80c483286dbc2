//! Application state for API handlers

use privgate_engine::{EngineConfig, PendingPrompts, PolicyEngine, RequestMediator};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Policy engine
    pub engine: Arc<PolicyEngine>,

    /// Mediator answering access requests
    pub mediator: Arc<RequestMediator>,

    /// Consent questions waiting for an answer
    pub prompts: Arc<PendingPrompts>,

    /// Engine configuration, for template lookup
    pub config: Arc<EngineConfig>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Wire the mediator to the pending-prompt queue
    pub fn new(engine: Arc<PolicyEngine>, config: EngineConfig) -> Self {
        let prompts = Arc::new(PendingPrompts::new(config.prompt_timeout()));
        let mediator = Arc::new(RequestMediator::new(engine.clone(), prompts.clone()));
        Self {
            engine,
            mediator,
            prompts,
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
