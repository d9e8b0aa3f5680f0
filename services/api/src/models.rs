//! API Models
//!
//! Data structures returned by the REST API. They mirror the core crate's
//! session summary in a shape suited to OpenAPI documentation with `utoipa`.

use chrono::{DateTime, Utc};
use interview_core::SessionSummary;
use interview_core::transcript::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillScores {
    #[schema(example = 7.5)]
    pub technical: f64,
    pub communication: f64,
    pub problem_solving: f64,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    #[schema(example = "interviewer")]
    pub role: String,
    pub text: String,
    #[serde(default)]
    pub reminder: bool,
}

/// A completed interview as handed over by the orchestrator.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResult {
    #[schema(value_type = String, format = Uuid)]
    pub session_id: Uuid,
    #[schema(example = "Backend Engineering")]
    pub field: String,
    #[schema(example = "senior")]
    pub level: String,
    #[schema(example = "en")]
    pub language: String,
    #[schema(example = "curriculum_finished")]
    pub reason: String,
    pub progress: u8,
    pub questions_asked: u32,
    pub covered_topics: Vec<String>,
    pub skill_assessment: SkillScores,
    pub transcript: Vec<TranscriptEntry>,
    pub completed_at: DateTime<Utc>,
}

impl InterviewResult {
    pub fn from_summary(
        session_id: Uuid,
        summary: SessionSummary,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let skills = summary.state.skill_assessment;
        let transcript = summary
            .transcript
            .turns()
            .iter()
            .map(|turn| TranscriptEntry {
                role: match turn.role {
                    Role::Interviewer => "interviewer",
                    Role::Candidate => "candidate",
                    Role::Directive => "directive",
                }
                .to_string(),
                text: turn.text.clone(),
                reminder: turn.reminder,
            })
            .collect();

        Self {
            session_id,
            field: summary.config.field,
            level: summary.config.level,
            language: summary.config.language.code().to_string(),
            reason: summary.reason.to_string(),
            progress: summary.state.progress,
            questions_asked: summary.state.questions_asked,
            covered_topics: summary.state.covered_topics.into_iter().collect(),
            skill_assessment: SkillScores {
                technical: skills.technical,
                communication: skills.communication,
                problem_solving: skills.problem_solving,
            },
            transcript,
            completed_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use interview_core::transcript::{Transcript, Turn};
    use interview_core::{
        CompletionReason, InterviewConfig, InterviewState, Language, SkillAssessment,
    };

    fn summary() -> SessionSummary {
        let mut transcript = Transcript::new();
        transcript.push(Turn::interviewer("Welcome! Tell me about yourself."));
        transcript.push(Turn::candidate("I build databases."));
        transcript.push(Turn::reminder("Are you still there?"));
        let mut state = InterviewState {
            progress: 100,
            questions_asked: 10,
            complete: true,
            skill_assessment: SkillAssessment {
                technical: 8.0,
                communication: 6.5,
                problem_solving: 7.0,
            },
            ..InterviewState::default()
        };
        state.covered_topics.insert("storage".to_string());
        state.covered_topics.insert("indexing".to_string());
        SessionSummary {
            session_id: "ignored".to_string(),
            config: InterviewConfig::new("Backend", "senior", Language::Fr),
            transcript,
            state,
            reason: CompletionReason::CurriculumFinished,
        }
    }

    #[test]
    fn test_interview_result_from_summary() {
        let id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let result = InterviewResult::from_summary(id, summary(), at);

        assert_eq!(result.session_id, id);
        assert_eq!(result.language, "fr");
        assert_eq!(result.reason, "curriculum_finished");
        assert_eq!(result.covered_topics, vec!["indexing", "storage"]);
        assert_eq!(result.skill_assessment.communication, 6.5);
        assert_eq!(result.transcript.len(), 3);
        assert_eq!(result.transcript[1].role, "candidate");
        assert!(result.transcript[2].reminder);
        assert_eq!(result.completed_at, at);
    }

    #[test]
    fn test_interview_result_serializes_camel_case() {
        let result = InterviewResult::from_summary(Uuid::nil(), summary(), Utc::now());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["questionsAsked"], 10);
        assert_eq!(json["skillAssessment"]["problemSolving"], 7.0);
        assert!(json.get("completedAt").is_some());
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Something went wrong".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Something went wrong"}"#);
    }
}
