//! Session and orchestrator configuration.

use crate::completion::CompletionPolicy;
use crate::locale::Language;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of curriculum questions per interview.
pub const DEFAULT_QUESTION_COUNT: u32 = 10;
/// Candidate inactivity before a reminder is sent.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(30_000);
/// Reminders sent before the session is cancelled.
pub const DEFAULT_MAX_REMINDERS: u32 = 3;
/// Upper bound on a single completion-service call.
pub const DEFAULT_AI_CALL_TIMEOUT: Duration = Duration::from_secs(20);

/// What the candidate signed up for. Immutable for the session lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewConfig {
    pub field: String,
    pub level: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub min_experience: Option<u32>,
    #[serde(default)]
    pub max_experience: Option<u32>,
    #[serde(default)]
    pub role_ids: Vec<String>,
}

impl InterviewConfig {
    pub fn new(field: impl Into<String>, level: impl Into<String>, language: Language) -> Self {
        Self {
            field: field.into(),
            level: level.into(),
            language,
            specialization: None,
            min_experience: None,
            max_experience: None,
            role_ids: Vec::new(),
        }
    }

    /// Short human-readable description used in instruction payloads.
    pub fn describe(&self) -> String {
        let mut out = format!("{} ({} level)", self.field, self.level);
        if let Some(spec) = &self.specialization {
            out.push_str(&format!(", specialization: {}", spec));
        }
        match (self.min_experience, self.max_experience) {
            (Some(min), Some(max)) => {
                out.push_str(&format!(", {}-{} years of experience", min, max))
            }
            (Some(min), None) => out.push_str(&format!(", at least {} years of experience", min)),
            (None, Some(max)) => out.push_str(&format!(", up to {} years of experience", max)),
            (None, None) => {}
        }
        out
    }
}

/// Knobs shared by every component of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub question_count: u32,
    pub idle_timeout: Duration,
    pub max_reminders: u32,
    pub ai_call_timeout: Duration,
    pub completion_policy: CompletionPolicy,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_reminders: DEFAULT_MAX_REMINDERS,
            ai_call_timeout: DEFAULT_AI_CALL_TIMEOUT,
            completion_policy: CompletionPolicy::default(),
        }
    }
}
