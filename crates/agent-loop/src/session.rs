//! Per-connection session state
//!
//! Each client connection gets its own session; conversation state is
//! never shared between connections. The session enforces single-flight:
//! at most one run may be in flight at a time, and a second problem
//! statement arriving mid-run is rejected by the transport.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::runner::AgentRunner;

/// One client connection's session
pub struct Session {
    id: Uuid,
    runner: Arc<AgentRunner>,
    in_flight: Arc<Mutex<()>>,
}

impl Session {
    pub fn new(runner: Arc<AgentRunner>) -> Self {
        Self {
            id: Uuid::new_v4(),
            runner,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Session identity, for logging
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The shared runner backing this session
    pub fn runner(&self) -> Arc<AgentRunner> {
        Arc::clone(&self.runner)
    }

    /// Claim the single-flight slot.
    ///
    /// Returns a guard that must be held for the duration of the run, or
    /// `None` when a run is already in flight.
    pub fn try_begin(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.in_flight).try_lock_owned().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitesmith_core::config::Config;
    use sitesmith_core::conversation::ConversationTurn;
    use sitesmith_core::model::{FunctionDeclaration, ModelClient, ModelReply};
    use std::path::PathBuf;

    struct IdleModel;

    #[async_trait::async_trait]
    impl ModelClient for IdleModel {
        async fn generate(
            &self,
            _system_instruction: &str,
            _history: &[ConversationTurn],
            _tools: &[FunctionDeclaration],
        ) -> sitesmith_core::Result<ModelReply> {
            Ok(ModelReply {
                text: Some("Done".to_string()),
                tool_calls: vec![],
            })
        }
    }

    fn session() -> Session {
        let config = Config {
            api_key: "test-key".to_string(),
            model: "idle".to_string(),
            output_dir: PathBuf::from("generated-site"),
            shell: PathBuf::from("/bin/bash"),
            max_turns: 50,
            port: 0,
        };
        Session::new(Arc::new(AgentRunner::new(Arc::new(IdleModel), &config)))
    }

    #[tokio::test]
    async fn test_single_flight_guard() {
        let session = session();

        let guard = session.try_begin().expect("slot should be free");
        assert!(session.try_begin().is_none());

        drop(guard);
        assert!(session.try_begin().is_some());
    }

    #[tokio::test]
    async fn test_sessions_have_distinct_identity() {
        assert_ne!(session().id(), session().id());
    }
}
