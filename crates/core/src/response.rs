//! Parsing of the completion service's structured turn output.
//!
//! The service is asked for a JSON object, but nothing about its output is
//! trusted: the object may be wrapped in prose or a code fence, fields may
//! be missing, and numbers may arrive as strings. Every field is optional
//! here and defaults are applied by the caller.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("response contains no JSON object")]
    NoJsonObject,
    #[error("malformed JSON object: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSkillAssessment {
    #[serde(deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<f64>")]
    pub technical: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<f64>")]
    pub communication: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", alias = "problem_solving")]
    #[schemars(with = "Option<f64>")]
    pub problem_solving: Option<f64>,
}

/// The structured reply requested from the completion service each turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AiTurnResponse {
    /// What the interviewer says to the candidate.
    #[serde(alias = "response", alias = "answer")]
    pub text: Option<String>,
    pub current_topic: Option<String>,
    pub next_topic: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    #[schemars(with = "Option<bool>")]
    pub should_advance_topic: Option<bool>,
    pub follow_up: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<f64>")]
    pub progress: Option<f64>,
    #[serde(deserialize_with = "lenient_bool", alias = "complete")]
    #[schemars(with = "Option<bool>")]
    pub is_complete: Option<bool>,
    #[serde(deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<f64>")]
    pub score: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    #[schemars(with = "Option<f64>")]
    pub questions_asked: Option<f64>,
    pub covered_topics: Option<Vec<String>>,
    pub skill_assessment: Option<AiSkillAssessment>,
}

impl AiTurnResponse {
    /// Non-blank interviewer text, if any.
    pub fn spoken_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Extracts and parses the first top-level JSON object in `raw`.
pub fn parse_turn_response(raw: &str) -> Result<AiTurnResponse, ResponseError> {
    let start = raw.find('{').ok_or(ResponseError::NoJsonObject)?;
    let end = raw.rfind('}').ok_or(ResponseError::NoJsonObject)?;
    if end < start {
        return Err(ResponseError::NoJsonObject);
    }
    Ok(serde_json::from_str(&raw[start..=end])?)
}

/// JSON schema of [`AiTurnResponse`], embedded in instruction payloads.
pub fn turn_response_schema() -> String {
    let schema = schemars::schema_for!(AiTurnResponse);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
