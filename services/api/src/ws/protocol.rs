//! Defines the WebSocket message protocol between the browser client and the API server.

use interview_core::{CompletionReason, InterviewConfig, SessionEvent, TurnResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Starts an interview. This must be the first message.
    #[serde(rename = "init")]
    Init { config: InterviewConfig },
    /// A typed or transcribed answer from the candidate.
    #[serde(rename = "candidate_message")]
    CandidateMessage { text: String },
    /// The avatar started rendering an interviewer utterance.
    #[serde(rename = "interviewer_speaking_started")]
    InterviewerSpeakingStarted,
    /// The avatar finished rendering; the candidate's turn begins.
    #[serde(rename = "interviewer_speaking_stopped")]
    InterviewerSpeakingStopped,
    /// The candidate or an operator ends the interview early.
    #[serde(rename = "end_interview")]
    EndInterview,
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the interview has started.
    Initialized { session_id: Uuid },
    /// A new interviewer turn to render.
    InterviewerTurn { result: TurnResult },
    /// An optional follow-up prompt attached to the previous turn.
    FollowUp { text: String },
    /// The interview finished normally; a result is available over REST.
    Complete {
        progress: u8,
        reason: CompletionReason,
    },
    /// The interview was cancelled after the candidate stayed silent.
    Cancelled,
    /// Reports an error to the client.
    Error { message: String },
}

impl From<SessionEvent> for ServerMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::InterviewerTurn(result) => ServerMessage::InterviewerTurn { result },
            SessionEvent::FollowUp { text } => ServerMessage::FollowUp { text },
            SessionEvent::Complete { progress, reason } => {
                ServerMessage::Complete { progress, reason }
            }
            SessionEvent::Cancelled => ServerMessage::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::Language;
    use serde_json::json;

    #[test]
    fn test_init_message_deserialization() {
        let raw = r#"{
            "type": "init",
            "config": {"field": "Data Engineering", "level": "mid", "language": "es", "minExperience": 2}
        }"#;
        match serde_json::from_str::<ClientMessage>(raw).unwrap() {
            ClientMessage::Init { config } => {
                assert_eq!(config.field, "Data Engineering");
                assert_eq!(config.language, Language::Es);
                assert_eq!(config.min_experience, Some(2));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_signal_messages_deserialization() {
        let stopped = r#"{"type": "interviewer_speaking_stopped"}"#;
        assert!(matches!(
            serde_json::from_str::<ClientMessage>(stopped).unwrap(),
            ClientMessage::InterviewerSpeakingStopped
        ));
        let message = r#"{"type": "candidate_message", "text": "hi"}"#;
        assert!(matches!(
            serde_json::from_str::<ClientMessage>(message).unwrap(),
            ClientMessage::CandidateMessage { text } if text == "hi"
        ));
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "user_message"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialization() {
        let complete: ServerMessage = SessionEvent::Complete {
            progress: 100,
            reason: CompletionReason::EndRequested,
        }
        .into();
        assert_eq!(
            serde_json::to_value(&complete).unwrap(),
            json!({"type": "complete", "progress": 100, "reason": "end_requested"})
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::from(SessionEvent::Cancelled)).unwrap(),
            json!({"type": "cancelled"})
        );
        let init = ServerMessage::Initialized {
            session_id: Uuid::nil(),
        };
        assert_eq!(
            serde_json::to_value(&init).unwrap()["session_id"],
            "00000000-0000-0000-0000-000000000000"
        );
    }
}
