//! Session scores and per-turn results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;

/// Clamps a score into `[SCORE_MIN, SCORE_MAX]`. NaN maps to the minimum.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        SCORE_MIN
    } else {
        value.clamp(SCORE_MIN, SCORE_MAX)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAssessment {
    pub technical: f64,
    pub communication: f64,
    pub problem_solving: f64,
}

impl SkillAssessment {
    pub fn clamped(self) -> Self {
        Self {
            technical: clamp_score(self.technical),
            communication: clamp_score(self.communication),
            problem_solving: clamp_score(self.problem_solving),
        }
    }

    pub fn average(&self) -> f64 {
        (self.technical + self.communication + self.problem_solving) / 3.0
    }
}

/// The evolving assessment of one interview session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewState {
    pub covered_topics: BTreeSet<String>,
    pub current_topic: Option<String>,
    pub skill_assessment: SkillAssessment,
    pub progress: u8,
    pub questions_asked: u32,
    /// Monotonic: never goes back to `false` once set.
    pub complete: bool,
}

/// Everything produced by one interviewer turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub text: String,
    pub current_topic: String,
    pub next_topic: Option<String>,
    pub should_advance_topic: bool,
    pub follow_up: Option<String>,
    pub progress: u8,
    pub complete: bool,
    pub score: f64,
    pub questions_asked: u32,
    pub covered_topics: Vec<String>,
    pub skill_assessment: SkillAssessment,
}

/// Topic label used when the completion service does not report one.
pub const UNKNOWN_TOPIC: &str = "unknown";
