//! Request mediation
//!
//! The mediator owns a request's continuation. Policy answers are delivered
//! directly; `Ask` goes to the consent collaborator and the user's choice is
//! recorded before the verdict is sent. Anything that goes wrong on the way
//! ends in Deny.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use privgate_types::{Scope, Sensitivity, UserChoice, Verdict};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::engine::{PolicyEngine, RecordOutcome};
use crate::error::Result;
use crate::request::AccessRequest;
use crate::resolution::Resolution;

/// What the consent UI is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentRequest {
    pub id: Uuid,
    pub scope: Scope,
    pub app: String,
    pub permission: String,
    pub purpose: String,
    pub library: String,
    pub sensitivity: Sensitivity,
    pub requested_at: DateTime<Utc>,
}

impl ConsentRequest {
    pub fn for_scope(scope: &Scope, requested_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            app: scope.app.to_string(),
            permission: scope.permission.display_name().to_string(),
            purpose: scope.purpose.description().to_string(),
            library: scope.library.display_name().to_string(),
            sensitivity: scope.permission.sensitivity(),
            scope: scope.clone(),
            requested_at,
        }
    }
}

/// The UI collaborator
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    async fn ask(&self, request: ConsentRequest) -> Result<UserChoice>;
}

/// Everything that happened while mediating one request
#[derive(Debug, Clone, Serialize)]
pub struct Mediation {
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice: Option<UserChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded: Option<RecordOutcome>,
}

impl Mediation {
    fn denied(resolution: Option<Resolution>, choice: Option<UserChoice>) -> Self {
        Self {
            verdict: Verdict::Deny,
            resolution,
            choice,
            recorded: None,
        }
    }
}

pub struct RequestMediator {
    engine: Arc<PolicyEngine>,
    prompt: Arc<dyn ConsentPrompt>,
}

impl RequestMediator {
    pub fn new(engine: Arc<PolicyEngine>, prompt: Arc<dyn ConsentPrompt>) -> Self {
        Self { engine, prompt }
    }

    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    /// Turn a request into a terminal verdict
    #[instrument(skip(self, request), fields(app = %request.app, permission = %request.permission))]
    pub async fn mediate(&self, request: &AccessRequest) -> Mediation {
        let resolution = match self.engine.resolve(request).await {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(error = %e, "Request could not be resolved, denying");
                return Mediation::denied(None, None);
            }
        };

        if let Some(verdict) = resolution.action.verdict() {
            debug!(verdict = %verdict, "Answered from policy");
            return Mediation {
                verdict,
                resolution: Some(resolution),
                choice: None,
                recorded: None,
            };
        }

        let consent = ConsentRequest::for_scope(&resolution.scope, self.engine.clock().now());
        let choice = match self.prompt.ask(consent).await {
            Ok(choice) => choice,
            Err(e) => {
                warn!(error = %e, "No answer from consent prompt, denying");
                return Mediation::denied(Some(resolution), None);
            }
        };

        let (action, durability) = choice.decision();
        match self.engine.record(action, &resolution.scope, durability).await {
            Ok(recorded) => {
                let verdict = choice.verdict();
                info!(choice = ?choice, verdict = %verdict, "User decision recorded");
                Mediation {
                    verdict,
                    resolution: Some(resolution),
                    choice: Some(choice),
                    recorded: Some(recorded),
                }
            }
            Err(e) => {
                warn!(error = %e, choice = ?choice, "User decision could not be recorded, denying");
                Mediation::denied(Some(resolution), Some(choice))
            }
        }
    }

    /// Mediate and answer the continuation exactly once
    pub async fn handle(&self, request: AccessRequest, reply: oneshot::Sender<Verdict>) -> Mediation {
        let mediation = self.mediate(&request).await;
        if reply.send(mediation.verdict).is_err() {
            debug!(app = %request.app, "Request source went away before the verdict");
        }
        mediation
    }

    /// Mediate on a background task; the receiver yields the verdict
    pub fn submit(self: &Arc<Self>, request: AccessRequest) -> oneshot::Receiver<Verdict> {
        let (tx, rx) = oneshot::channel();
        let mediator = Arc::clone(self);
        tokio::spawn(async move {
            mediator.handle(request, tx).await;
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::EngineConfig;
    use crate::error::EngineError;
    use crate::prompts::FixedPrompt;
    use privgate_store::InMemoryPolicyStore;
    use privgate_types::{Action, Durability, ScopeDraft, Taxonomy};

    async fn engine() -> Arc<PolicyEngine> {
        Arc::new(
            PolicyEngine::start(
                Arc::new(Taxonomy::standard()),
                Arc::new(InMemoryPolicyStore::new()),
                Arc::new(ManualClock::starting_now()),
                &EngineConfig::default(),
            )
            .await
            .unwrap(),
        )
    }

    struct FailingPrompt;

    #[async_trait]
    impl ConsentPrompt for FailingPrompt {
        async fn ask(&self, _request: ConsentRequest) -> Result<UserChoice> {
            Err(EngineError::Prompt("ui crashed".into()))
        }
    }

    #[tokio::test]
    async fn ask_is_resolved_through_the_prompt() {
        let engine = engine().await;
        let prompt = Arc::new(FixedPrompt::new(UserChoice::AlwaysAllow));
        let mediator = RequestMediator::new(engine.clone(), prompt.clone());
        let request = AccessRequest::new("A", "CAMERA").with_purpose("RUNNING_OTHER_FEATURES");

        let first = mediator.mediate(&request).await;
        assert_eq!(first.verdict, Verdict::Allow);
        assert!(matches!(first.recorded, Some(RecordOutcome::Persisted(_))));

        // Persisted, so the second request never reaches the prompt.
        let second = mediator.mediate(&request).await;
        assert_eq!(second.verdict, Verdict::Allow);
        assert!(second.choice.is_none());
        assert_eq!(prompt.asked(), 1);
    }

    #[tokio::test]
    async fn prompt_failure_fails_closed() {
        let mediator = RequestMediator::new(engine().await, Arc::new(FailingPrompt));
        let request = AccessRequest::new("A", "SMS");
        let (tx, rx) = oneshot::channel();
        let mediation = mediator.handle(request, tx).await;
        assert_eq!(mediation.verdict, Verdict::Deny);
        assert_eq!(rx.await.unwrap(), Verdict::Deny);
    }

    #[tokio::test]
    async fn unknown_permission_is_denied() {
        let mediator = Arc::new(RequestMediator::new(
            engine().await,
            Arc::new(FixedPrompt::new(UserChoice::AllowOnce)),
        ));
        let verdict = mediator
            .submit(AccessRequest::new("A", "X_RAY"))
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Deny);
    }

    #[tokio::test]
    async fn stored_deny_skips_the_prompt() {
        let engine = engine().await;
        let scope = engine
            .build_scope(&ScopeDraft::new("*", "CALL_LOG").purpose("ALL"))
            .unwrap();
        engine
            .record(Action::Deny, &scope, Durability::Always)
            .await
            .unwrap();

        let prompt = Arc::new(FixedPrompt::new(UserChoice::AlwaysAllow));
        let mediator = RequestMediator::new(engine, prompt.clone());
        let mediation = mediator
            .mediate(&AccessRequest::new("A", "CALL_LOG"))
            .await;
        assert_eq!(mediation.verdict, Verdict::Deny);
        assert_eq!(prompt.asked(), 0);
    }
}
