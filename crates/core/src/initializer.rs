//! Session Initializer
//!
//! Fetches the curriculum and produces the opening interviewer turn. Never
//! fails: every collaborator error degrades to scripted content.

use crate::assessment::{SkillAssessment, TurnResult};
use crate::config::{InterviewConfig, OrchestratorSettings};
use crate::curriculum::{Curriculum, QuestionBank};
use crate::llm_client::{CompletionRequest, CompletionService, request_turn_response};
use crate::processor::ensure_verbatim;
use crate::prompt::{InstructionBuilder, NextStep};
use crate::store::SessionStateStore;
use crate::transcript::Turn;
use std::sync::Arc;
use tracing::{info, warn};

const OPENING_TOPIC: &str = "introduction";

pub struct SessionInitializer {
    completion: Arc<dyn CompletionService>,
    question_bank: Option<Arc<dyn QuestionBank>>,
    instructions: InstructionBuilder,
    settings: OrchestratorSettings,
}

impl SessionInitializer {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        question_bank: Option<Arc<dyn QuestionBank>>,
        settings: OrchestratorSettings,
        persona: Option<String>,
    ) -> Self {
        Self {
            completion,
            question_bank,
            instructions: InstructionBuilder::new(persona, settings.question_count),
            settings,
        }
    }

    /// Fetches up to `question_count` questions for the session's field and level.
    pub async fn fetch_curriculum(&self, config: &InterviewConfig) -> Option<Curriculum> {
        let bank = self.question_bank.as_ref()?;
        let count = self.settings.question_count as usize;
        let fetched = tokio::time::timeout(
            self.settings.ai_call_timeout,
            bank.fetch(&config.field, &config.level, count),
        )
        .await;
        match fetched {
            Ok(Ok(Some(questions))) => {
                let curriculum = Curriculum::new(questions, count);
                match &curriculum {
                    Some(c) => info!(questions = c.len(), "Curriculum loaded"),
                    None => info!("Question bank returned only blank questions"),
                }
                curriculum
            }
            Ok(Ok(None)) => {
                info!(
                    field = %config.field,
                    level = %config.level,
                    "No curriculum available; using open questions"
                );
                None
            }
            Ok(Err(e)) => {
                warn!(error = ?e, "Question bank unavailable; using open questions");
                None
            }
            Err(_) => {
                warn!("Question bank timed out; using open questions");
                None
            }
        }
    }

    /// Builds the session store and its opening turn.
    pub async fn start(&self, config: InterviewConfig) -> (SessionStateStore, TurnResult) {
        let curriculum = self.fetch_curriculum(&config).await;
        let mut store = SessionStateStore::new(config, curriculum);
        let result = self.open(&mut store).await;
        (store, result)
    }

    /// Produces the greeting plus the first question and appends it to `store`.
    pub async fn open(&self, store: &mut SessionStateStore) -> TurnResult {
        let config = store.config();
        let language = config.language;
        let first_question = match store.curriculum() {
            Some(curriculum) => curriculum.first().to_string(),
            None => language.introduction_question().to_string(),
        };

        let instruction = self
            .instructions
            .build(config, 0, &NextStep::OpenWith(&first_question));
        let response = request_turn_response(
            self.completion.as_ref(),
            self.settings.ai_call_timeout,
            CompletionRequest {
                instruction,
                turns: Vec::new(),
            },
        )
        .await;

        let text = match response.as_ref().and_then(|r| r.spoken_text()) {
            Some(text) => ensure_verbatim(text.to_string(), &first_question),
            None => format!("{} {}", language.greeting(&config.field), first_question),
        };
        let current_topic = response
            .and_then(|r| r.current_topic)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| OPENING_TOPIC.to_string());

        let result = TurnResult {
            text: text.clone(),
            current_topic,
            next_topic: None,
            should_advance_topic: false,
            follow_up: None,
            progress: 0,
            complete: false,
            score: 0.0,
            questions_asked: 0,
            covered_topics: Vec::new(),
            skill_assessment: SkillAssessment::default(),
        };
        store.append(Turn::interviewer(text));
        store.apply(&result);
        result
    }
}
