use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const NO_DATA_MESSAGE: &str = "No unprocessed transactions found for this date";
pub const INVOCATION_ERROR_PREFIX: &str = "OpenAI API call failed";
pub const DECODE_ERROR_MESSAGE: &str = "Failed to parse LLM response as JSON.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub transaction_id: String,
    pub category: String,
    pub description: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub reason: String,
}

/// Terminal outcome of one recommendation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationResult {
    Success(Vec<RecommendationEntry>),
    NoData { message: String, date: String },
    InvocationError { detail: String },
    DecodeError { detail: String, raw_response: String },
}

impl RecommendationResult {
    pub fn no_data(date: &str) -> Self {
        Self::NoData {
            message: NO_DATA_MESSAGE.to_string(),
            date: date.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::InvocationError { .. } | Self::DecodeError { .. }
        )
    }

    pub fn entries(&self) -> &[RecommendationEntry] {
        match self {
            Self::Success(entries) => entries,
            _ => &[],
        }
    }

    /// Renders the result as the flat JSON payload callers branch on: an array of entries,
    /// `{message, date}`, `{error}` or `{error, raw_response}`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Success(entries) => json!(entries),
            Self::NoData { message, date } => json!({ "message": message, "date": date }),
            Self::InvocationError { detail } => {
                json!({ "error": format!("{INVOCATION_ERROR_PREFIX}: {detail}") })
            }
            Self::DecodeError { raw_response, .. } => json!({
                "error": DECODE_ERROR_MESSAGE,
                "raw_response": raw_response,
            }),
        }
    }
}
