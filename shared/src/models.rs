//! Shared data models.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::http::ApiResponse;
use crate::media::ImagePayload;

/// One user-initiated analysis.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: ImagePayload,
}

impl AnalysisRequest {
    pub fn new(image: ImagePayload) -> Self {
        Self { image }
    }

    /// Wire form checked against a capability's input schema.
    pub fn to_input(&self) -> Value {
        json!({ "photoDataUri": self.image.data_uri() })
    }
}

/// Validated model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Short description of the expression
    pub mood: String,
    /// Emoji, when the capability asks for one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Free-text comment, when the capability asks for one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
}

/// Outcome handed back across the facade boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEnvelope {
    Success(AnalysisResult),
    Failure { message: String },
}

impl ResultEnvelope {
    pub fn failure(message: impl Into<String>) -> Self {
        ResultEnvelope::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success(_))
    }
}

impl From<ResultEnvelope> for ApiResponse<AnalysisResult> {
    fn from(envelope: ResultEnvelope) -> Self {
        match envelope {
            ResultEnvelope::Success(result) => ApiResponse::success(result),
            ResultEnvelope::Failure { message } => ApiResponse {
                success: false,
                data: None,
                error: Some(message),
            },
        }
    }
}

/// Analyze request payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub photo_data_uri: Option<String>,
}
