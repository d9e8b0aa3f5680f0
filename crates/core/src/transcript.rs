//! Interview transcript
//!
//! The append-only record of every turn, and the counters derived from it.

use serde::{Deserialize, Serialize};

/// Author of a single turn in the interview transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Interviewer,
    Candidate,
    /// An instruction injected by the orchestrator (a reminder request or an
    /// end-of-interview request). Never shown to the candidate.
    Directive,
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Set on interviewer turns produced by the idle escalator. Reminders are
    /// not questions and are excluded from the question counter.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reminder: bool,
}

impl Turn {
    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            role: Role::Interviewer,
            text: text.into(),
            reminder: false,
        }
    }

    pub fn reminder(text: impl Into<String>) -> Self {
        Self {
            role: Role::Interviewer,
            text: text.into(),
            reminder: true,
        }
    }

    pub fn candidate(text: impl Into<String>) -> Self {
        Self {
            role: Role::Candidate,
            text: text.into(),
            reminder: false,
        }
    }

    pub fn directive(text: impl Into<String>) -> Self {
        Self {
            role: Role::Directive,
            text: text.into(),
            reminder: false,
        }
    }

    /// Whether this turn counts towards `questions_asked`.
    pub fn is_question(&self) -> bool {
        self.role == Role::Interviewer && !self.reminder
    }
}

/// Number of questions asked given the count of non-reminder interviewer
/// turns. The first interviewer turn is the greeting and is discounted.
pub fn questions_asked(interviewer_turns: u32) -> u32 {
    interviewer_turns.saturating_sub(1)
}

/// Progress percentage for `questions_asked` out of `question_count`.
pub fn progress_for(questions_asked: u32, question_count: u32) -> u8 {
    let total = question_count.max(1) as f64;
    let pct = (100.0 * questions_asked as f64 / total).round();
    pct.min(100.0) as u8
}

/// Ordered, append-only sequence of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Non-reminder interviewer turns, greeting included.
    pub fn interviewer_turns(&self) -> u32 {
        self.turns.iter().filter(|t| t.is_question()).count() as u32
    }

    /// Genuine candidate answers (directives excluded).
    pub fn candidate_answers(&self) -> u32 {
        self.turns
            .iter()
            .filter(|t| t.role == Role::Candidate)
            .count() as u32
    }

    /// Questions asked so far, derived from the transcript alone.
    pub fn questions_asked(&self) -> u32 {
        questions_asked(self.interviewer_turns())
    }

    /// Text of the most recent question put to the candidate.
    pub fn last_question(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.is_question())
            .map(|t| t.text.as_str())
    }
}
