//! Consent prompt implementations
//!
//! [`PendingPrompts`] parks each question until something answers it (the
//! daemon exposes the queue over HTTP) or the timeout passes.
//! [`FixedPrompt`] answers every question the same way.

use async_trait::async_trait;
use dashmap::DashMap;
use privgate_types::UserChoice;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::mediator::{ConsentPrompt, ConsentRequest};

struct PendingPrompt {
    request: ConsentRequest,
    reply: oneshot::Sender<UserChoice>,
}

/// Queue of questions waiting for a user answer
pub struct PendingPrompts {
    pending: DashMap<Uuid, PendingPrompt>,
    timeout: Duration,
}

impl PendingPrompts {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            timeout,
        }
    }

    /// Questions still waiting, oldest first
    pub fn pending(&self) -> Vec<ConsentRequest> {
        let mut listed: Vec<ConsentRequest> = self
            .pending
            .iter()
            .map(|p| p.request.clone())
            .collect();
        listed.sort_by_key(|r| r.requested_at);
        listed
    }

    /// Answer the question `id`
    pub fn answer(&self, id: Uuid, choice: UserChoice) -> Result<()> {
        let (_, prompt) = self
            .pending
            .remove(&id)
            .ok_or(EngineError::PromptNotFound(id))?;
        prompt
            .reply
            .send(choice)
            .map_err(|_| EngineError::PromptNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[async_trait]
impl ConsentPrompt for PendingPrompts {
    async fn ask(&self, request: ConsentRequest) -> Result<UserChoice> {
        let id = request.id;
        let (reply, answer) = oneshot::channel();
        self.pending.insert(id, PendingPrompt { request, reply });
        debug!(prompt = %id, "Waiting for user decision");

        match tokio::time::timeout(self.timeout, answer).await {
            Ok(Ok(choice)) => Ok(choice),
            Ok(Err(_)) => {
                self.pending.remove(&id);
                Err(EngineError::Prompt(format!("prompt {id} was dropped")))
            }
            Err(_) => {
                self.pending.remove(&id);
                warn!(prompt = %id, "Prompt timed out");
                Err(EngineError::Prompt(format!(
                    "prompt {id} unanswered after {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

impl std::fmt::Debug for PendingPrompts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingPrompts")
            .field("pending", &self.pending.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Answers every question with the same choice
#[derive(Debug)]
pub struct FixedPrompt {
    choice: UserChoice,
    asked: AtomicUsize,
}

impl FixedPrompt {
    pub fn new(choice: UserChoice) -> Self {
        Self {
            choice,
            asked: AtomicUsize::new(0),
        }
    }

    /// How many questions have been answered
    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ConsentPrompt for FixedPrompt {
    async fn ask(&self, _request: ConsentRequest) -> Result<UserChoice> {
        self.asked.fetch_add(1, Ordering::Relaxed);
        Ok(self.choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use privgate_types::{ScopeDraft, Taxonomy};
    use std::sync::Arc;

    fn consent() -> ConsentRequest {
        let scope = ScopeDraft::new("A", "MICROPHONE")
            .purpose("ALL")
            .build(&Taxonomy::standard())
            .unwrap();
        ConsentRequest::for_scope(&scope, Utc::now())
    }

    #[tokio::test]
    async fn answered_prompt_returns_choice() {
        let prompts = Arc::new(PendingPrompts::new(Duration::from_secs(60)));
        let asking = {
            let prompts = prompts.clone();
            tokio::spawn(async move { prompts.ask(consent()).await })
        };

        while prompts.is_empty() {
            tokio::task::yield_now().await;
        }
        let waiting = prompts.pending();
        assert_eq!(waiting[0].permission, "Microphone");
        prompts.answer(waiting[0].id, UserChoice::AllowOnce).unwrap();

        assert_eq!(asking.await.unwrap().unwrap(), UserChoice::AllowOnce);
        assert!(prompts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_prompt_times_out() {
        let prompts = PendingPrompts::new(Duration::from_secs(5));
        let result = prompts.ask(consent()).await;
        assert!(matches!(result, Err(EngineError::Prompt(_))));
        assert!(prompts.is_empty());
    }

    #[test]
    fn answering_unknown_prompt_fails() {
        let prompts = PendingPrompts::new(Duration::from_secs(5));
        let id = Uuid::new_v4();
        assert!(matches!(
            prompts.answer(id, UserChoice::AlwaysDeny),
            Err(EngineError::PromptNotFound(found)) if found == id
        ));
    }
}
