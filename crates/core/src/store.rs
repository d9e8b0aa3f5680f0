//! Session State Store
//!
//! The single source of truth for one interview: its configuration,
//! curriculum, transcript and assessment. Owned by exactly one session task;
//! nothing here is shared or locked.

use crate::assessment::{InterviewState, TurnResult};
use crate::config::InterviewConfig;
use crate::curriculum::Curriculum;
use crate::transcript::{Transcript, Turn};

#[derive(Debug, Clone)]
pub struct SessionStateStore {
    config: InterviewConfig,
    curriculum: Option<Curriculum>,
    transcript: Transcript,
    state: InterviewState,
}

impl SessionStateStore {
    pub fn new(config: InterviewConfig, curriculum: Option<Curriculum>) -> Self {
        Self {
            config,
            curriculum,
            transcript: Transcript::new(),
            state: InterviewState::default(),
        }
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    pub fn curriculum(&self) -> Option<&Curriculum> {
        self.curriculum.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn append(&mut self, turn: Turn) {
        self.transcript.push(turn);
    }

    pub fn current_state(&self) -> InterviewState {
        self.state.clone()
    }

    pub fn state(&self) -> &InterviewState {
        &self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.complete
    }

    /// Folds a turn result into the state.
    ///
    /// Counters only move forward and `complete` never reverts, whatever the
    /// result says.
    pub fn apply(&mut self, result: &TurnResult) {
        let state = &mut self.state;
        state.complete |= result.complete;
        state.questions_asked = state.questions_asked.max(result.questions_asked);
        state.progress = if state.complete {
            100
        } else {
            state.progress.max(result.progress.min(100))
        };
        state.skill_assessment = result.skill_assessment.clamped();
        state
            .covered_topics
            .extend(result.covered_topics.iter().cloned());
        state.current_topic = Some(result.current_topic.clone());
    }

    /// Discards the transcript and assessment, keeping config and curriculum.
    pub fn reset(&mut self) {
        self.transcript = Transcript::new();
        self.state = InterviewState::default();
    }
}
