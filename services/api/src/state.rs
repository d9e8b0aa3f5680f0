//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the completion client and the result store.

use crate::config::Config;
use crate::results::ResultStore;
use interview_core::curriculum::QuestionBank;
use interview_core::llm_client::CompletionService;
use interview_core::SessionDeps;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub completion: Arc<dyn CompletionService>,
    pub question_bank: Option<Arc<dyn QuestionBank>>,
    pub results: Arc<ResultStore>,
    pub persona: Option<String>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Collaborators for one new interview session.
    pub fn session_deps(&self) -> SessionDeps {
        SessionDeps {
            completion: self.completion.clone(),
            question_bank: self.question_bank.clone(),
            results: self.results.clone(),
            settings: self.config.orchestrator.clone(),
            persona: self.persona.clone(),
        }
    }
}
