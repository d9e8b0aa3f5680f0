pub mod assessment;
pub mod completion;
pub mod config;
pub mod curriculum;
pub mod directive;
pub mod escalator;
pub mod initializer;
pub mod llm_client;
pub mod locale;
pub mod processor;
pub mod prompt;
pub mod response;
pub mod session;
pub mod store;
pub mod transcript;

pub use assessment::{InterviewState, SkillAssessment, TurnResult};
pub use completion::{CompletionPolicy, CompletionReason};
pub use config::{InterviewConfig, OrchestratorSettings};
pub use locale::Language;
pub use session::{
    InterviewSession, ResultSink, SessionCommand, SessionDeps, SessionError, SessionEvent,
    SessionHandle, SessionSummary,
};
