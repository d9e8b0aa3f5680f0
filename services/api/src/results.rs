//! In-memory store of completed interviews.

use crate::models::InterviewResult;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use interview_core::{ResultSink, SessionSummary};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

#[derive(Default)]
pub struct ResultStore {
    results: RwLock<HashMap<Uuid, InterviewResult>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, session_id: Uuid) -> Option<InterviewResult> {
        self.results.read().await.get(&session_id).cloned()
    }
}

#[async_trait]
impl ResultSink for ResultStore {
    async fn persist(&self, summary: SessionSummary) -> Result<()> {
        let session_id = Uuid::parse_str(&summary.session_id)
            .with_context(|| format!("Invalid session id '{}'", summary.session_id))?;
        let result = InterviewResult::from_summary(session_id, summary, Utc::now());
        info!(
            %session_id,
            reason = %result.reason,
            questions_asked = result.questions_asked,
            "Stored interview result"
        );
        self.results.write().await.insert(session_id, result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::transcript::Transcript;
    use interview_core::{CompletionReason, InterviewConfig, InterviewState, Language};

    fn summary(session_id: &str) -> SessionSummary {
        SessionSummary {
            session_id: session_id.to_string(),
            config: InterviewConfig::new("Frontend", "junior", Language::En),
            transcript: Transcript::new(),
            state: InterviewState::default(),
            reason: CompletionReason::EndRequested,
        }
    }

    #[tokio::test]
    async fn test_persist_and_get() {
        let store = ResultStore::new();
        let id = Uuid::new_v4();
        store.persist(summary(&id.to_string())).await.unwrap();

        let stored = store.get(id).await.expect("result should be stored");
        assert_eq!(stored.field, "Frontend");
        assert_eq!(stored.reason, "end_requested");
        assert_eq!(store.get(Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn test_persist_rejects_foreign_session_ids() {
        let store = ResultStore::new();
        assert!(store.persist(summary("not-a-uuid")).await.is_err());
        assert!(store.results.read().await.is_empty());
    }
}
