//! Curriculum and Question Bank
//!
//! A curriculum is the fixed, ordered list of questions assigned to a session
//! before it starts. Questions come from a [`QuestionBank`]; when none is
//! available the interviewer falls back to open-ended questioning.

use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Fixed ordered questions for one session. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curriculum {
    questions: Vec<String>,
}

impl Curriculum {
    /// Builds a curriculum from at most `limit` non-blank questions.
    /// Returns `None` if nothing usable remains.
    pub fn new(questions: Vec<String>, limit: usize) -> Option<Self> {
        let questions: Vec<String> = questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(limit)
            .collect();
        if questions.is_empty() {
            None
        } else {
            Some(Self { questions })
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn first(&self) -> &str {
        &self.questions[0]
    }

    /// The question to ask once `questions_asked` have been asked: the next
    /// unanswered item, or the last one once the list is exhausted.
    pub fn next_question(&self, questions_asked: u32) -> &str {
        let index = (questions_asked as usize).min(self.questions.len() - 1);
        &self.questions[index]
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }
}

/// Defines the contract for any service that can supply interview questions.
///
/// This abstraction allows the system to swap between different question
/// sources (e.g., AI-generated, static, database-backed) while keeping a
/// consistent interface for bootstrapping interview sessions.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Fetches up to `count` ordered questions for a field and level.
    ///
    /// `Ok(None)` means the bank has nothing for this combination.
    async fn fetch(&self, field: &str, level: &str, count: usize) -> Result<Option<Vec<String>>>;
}

/// A `QuestionBank` that asks an OpenAI-compatible model to write the questions.
pub struct LlmQuestionBank {
    client: Client<OpenAIConfig>,
    model: String,
    prompts: HashMap<String, String>,
}

impl LlmQuestionBank {
    /// Creates a new LLM-based question bank.
    ///
    /// # Arguments
    ///
    /// * `config` - OpenAI API configuration (API key, base URL, etc.).
    /// * `model` - Model identifier to use for generation (e.g., "gpt-4o").
    /// * `prompts` - A map of template strings, which must include a key
    ///   for `"generate_questions"` with `{field}`, `{level}` and `{count}`
    ///   placeholders.
    pub fn new(config: OpenAIConfig, model: String, prompts: HashMap<String, String>) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            prompts,
        }
    }
}

/// Parses numbered list items ("1. ..." or "1) ...") from model output.
pub fn parse_numbered_list(answer: &str) -> Vec<String> {
    answer
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let idx = line.find(['.', ')'])?;
            if !line[..idx].chars().all(|c| c.is_ascii_digit()) || idx == 0 {
                return None;
            }
            let question = line[idx + 1..].trim().to_string();
            (!question.is_empty()).then_some(question)
        })
        .collect()
}

#[async_trait]
impl QuestionBank for LlmQuestionBank {
    async fn fetch(&self, field: &str, level: &str, count: usize) -> Result<Option<Vec<String>>> {
        let prompt_template = self
            .prompts
            .get("generate_questions")
            .context("Missing prompt template: 'generate_questions'")?;
        let prompt = prompt_template
            .replace("{field}", field)
            .replace("{level}", level)
            .replace("{count}", &count.to_string());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content("You are an experienced technical interviewer preparing a question list.")
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let answer = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .as_ref()
            .context("No content in LLM response")?;

        let questions = parse_numbered_list(answer);
        Ok((!questions.is_empty()).then_some(questions))
    }
}

/// An in-memory `QuestionBank` keyed by field and level (case-insensitive).
///
/// Useful for development, tests and deployments with a curated question set.
#[derive(Debug, Default, Clone)]
pub struct StaticQuestionBank {
    banks: HashMap<(String, String), Vec<String>>,
}

impl StaticQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_questions(
        mut self,
        field: &str,
        level: &str,
        questions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.banks.insert(
            (field.to_lowercase(), level.to_lowercase()),
            questions.into_iter().map(Into::into).collect(),
        );
        self
    }
}

#[async_trait]
impl QuestionBank for StaticQuestionBank {
    async fn fetch(&self, field: &str, level: &str, count: usize) -> Result<Option<Vec<String>>> {
        Ok(self
            .banks
            .get(&(field.to_lowercase(), level.to_lowercase()))
            .map(|qs| qs.iter().take(count).cloned().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curriculum_trims_and_limits() {
        let curriculum = Curriculum::new(
            vec![" Q1 ".into(), "".into(), "Q2".into(), "Q3".into()],
            2,
        )
        .unwrap();
        assert_eq!(curriculum.questions(), ["Q1", "Q2"]);
        assert_eq!(curriculum.first(), "Q1");
        assert!(Curriculum::new(vec!["  ".into()], 10).is_none());
    }

    #[test]
    fn test_next_question_clamps_to_last() {
        let curriculum = Curriculum::new(vec!["A".into(), "B".into(), "C".into()], 10).unwrap();
        assert_eq!(curriculum.next_question(0), "A");
        assert_eq!(curriculum.next_question(2), "C");
        assert_eq!(curriculum.next_question(9), "C");
    }

    #[test]
    fn test_parse_numbered_list() {
        let answer = "Here are the questions:\n1. What is a closure?\n2) Explain lifetimes.\n- not numbered\n3.   \nv2. nope";
        assert_eq!(
            parse_numbered_list(answer),
            vec!["What is a closure?".to_string(), "Explain lifetimes.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_static_bank_lookup_is_case_insensitive() {
        let bank = StaticQuestionBank::new().with_questions("Backend", "Senior", ["a", "b", "c"]);
        let found = bank.fetch("backend", "SENIOR", 2).await.unwrap();
        assert_eq!(found, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(bank.fetch("frontend", "senior", 2).await.unwrap(), None);
    }
}
