//! Completion Evaluator
//!
//! Decides whether an interview is over from counters and the completion
//! service's self-report. The function is pure so it can be exercised
//! exhaustively without a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much weight the completion service's own `isComplete` flag carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// The self-report is ignored; only the curriculum counter or an explicit
    /// end directive can finish the interview.
    #[default]
    RequireCoverage,
    /// The self-report alone is enough to finish the interview.
    TrustAi,
}

impl FromStr for CompletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "require_coverage" => Ok(CompletionPolicy::RequireCoverage),
            "trust_ai" => Ok(CompletionPolicy::TrustAi),
            other => Err(format!("unknown completion policy '{}'", other)),
        }
    }
}

/// Why a session finished normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Every curriculum question was asked and answered.
    CurriculumFinished,
    /// The completion service reported the interview as finished.
    InterviewerConcluded,
    /// The candidate or an operator asked to end the interview.
    EndRequested,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionReason::CurriculumFinished => write!(f, "curriculum_finished"),
            CompletionReason::InterviewerConcluded => write!(f, "interviewer_concluded"),
            CompletionReason::EndRequested => write!(f, "end_requested"),
        }
    }
}

/// Inputs to a completion decision for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionSignals {
    pub questions_asked: u32,
    pub candidate_answers: u32,
    pub ai_reported_complete: bool,
    pub end_directive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvaluator {
    question_count: u32,
    policy: CompletionPolicy,
}

impl CompletionEvaluator {
    pub fn new(question_count: u32, policy: CompletionPolicy) -> Self {
        Self {
            question_count,
            policy,
        }
    }

    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    /// Returns the reason the session is complete, or `None` if it is not.
    ///
    /// The counter condition requires the final question to have been
    /// answered, not merely asked.
    pub fn evaluate(&self, signals: CompletionSignals) -> Option<CompletionReason> {
        if signals.end_directive {
            return Some(CompletionReason::EndRequested);
        }
        if signals.questions_asked >= self.question_count
            && signals.candidate_answers >= self.question_count
        {
            return Some(CompletionReason::CurriculumFinished);
        }
        if signals.ai_reported_complete && self.policy == CompletionPolicy::TrustAi {
            return Some(CompletionReason::InterviewerConcluded);
        }
        None
    }

    pub fn is_complete(&self, signals: CompletionSignals) -> bool {
        self.evaluate(signals).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(asked: u32, answers: u32, ai: bool, end: bool) -> CompletionSignals {
        CompletionSignals {
            questions_asked: asked,
            candidate_answers: answers,
            ai_reported_complete: ai,
            end_directive: end,
        }
    }

    #[test]
    fn test_counter_requires_final_answer() {
        let eval = CompletionEvaluator::new(10, CompletionPolicy::RequireCoverage);
        assert!(!eval.is_complete(signals(10, 9, false, false)));
        assert_eq!(
            eval.evaluate(signals(10, 10, false, false)),
            Some(CompletionReason::CurriculumFinished)
        );
    }

    #[test]
    fn test_end_directive_always_completes() {
        let eval = CompletionEvaluator::new(10, CompletionPolicy::RequireCoverage);
        assert_eq!(
            eval.evaluate(signals(0, 0, false, true)),
            Some(CompletionReason::EndRequested)
        );
    }

    #[test]
    fn test_premature_ai_completion_depends_on_policy() {
        let strict = CompletionEvaluator::new(10, CompletionPolicy::RequireCoverage);
        assert!(!strict.is_complete(signals(4, 4, true, false)));

        let trusting = CompletionEvaluator::new(10, CompletionPolicy::TrustAi);
        assert_eq!(
            trusting.evaluate(signals(4, 4, true, false)),
            Some(CompletionReason::InterviewerConcluded)
        );
    }

    #[test]
    fn test_monotonic_over_growing_counters() {
        let eval = CompletionEvaluator::new(3, CompletionPolicy::RequireCoverage);
        let mut seen_complete = false;
        for n in 0..8 {
            let done = eval.is_complete(signals(n, n, false, false));
            if seen_complete {
                assert!(done, "completion regressed at {}", n);
            }
            seen_complete |= done;
        }
        assert!(seen_complete);
    }

    #[test]
    fn test_idempotent() {
        let eval = CompletionEvaluator::new(5, CompletionPolicy::TrustAi);
        let s = signals(2, 2, true, false);
        assert_eq!(eval.evaluate(s), eval.evaluate(s));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "trust_ai".parse::<CompletionPolicy>(),
            Ok(CompletionPolicy::TrustAi)
        );
        assert_eq!(
            "REQUIRE_COVERAGE".parse::<CompletionPolicy>(),
            Ok(CompletionPolicy::RequireCoverage)
        );
        assert!("whenever".parse::<CompletionPolicy>().is_err());
    }
}
