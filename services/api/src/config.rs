use interview_core::{CompletionPolicy, OrchestratorSettings};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where interview questions come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionSource {
    /// Generated per session by the chat model.
    Llm,
    /// No curriculum; the interviewer asks open questions.
    None,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub openai_api_key: String,
    pub openai_api_base: Option<String>,
    pub chat_model: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
    pub question_source: QuestionSource,
    pub orchestrator: OrchestratorSettings,
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn parse_millis(name: &str, default: Duration) -> Result<Duration, ConfigError> {
    let millis = parse_var(name, default.as_millis() as u64)?;
    if millis == 0 {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_millis(millis))
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;
        let openai_api_base = std::env::var("OPENAI_API_BASE").ok();

        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        let source_str = std::env::var("QUESTION_SOURCE").unwrap_or_else(|_| "llm".to_string());
        let question_source = match source_str.to_lowercase().as_str() {
            "llm" => QuestionSource::Llm,
            "none" => QuestionSource::None,
            other => {
                return Err(ConfigError::InvalidValue(
                    "QUESTION_SOURCE".to_string(),
                    format!("'{}' is not one of 'llm', 'none'", other),
                ));
            }
        };

        let defaults = OrchestratorSettings::default();
        let question_count = parse_var("QUESTION_COUNT", defaults.question_count)?;
        if question_count == 0 {
            return Err(ConfigError::InvalidValue(
                "QUESTION_COUNT".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let orchestrator = OrchestratorSettings {
            question_count,
            idle_timeout: parse_millis("IDLE_TIMEOUT_MS", defaults.idle_timeout)?,
            max_reminders: parse_var("MAX_REMINDERS", defaults.max_reminders)?,
            ai_call_timeout: parse_millis("AI_CALL_TIMEOUT_MS", defaults.ai_call_timeout)?,
            completion_policy: parse_var::<CompletionPolicy>(
                "COMPLETION_POLICY",
                defaults.completion_policy,
            )?,
        };

        Ok(Self {
            bind_address,
            openai_api_key,
            openai_api_base,
            chat_model,
            log_level,
            prompts_path,
            question_source,
            orchestrator,
        })
    }
}
