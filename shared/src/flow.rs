//! Prompt invocation flow: render, call the model once, validate the reply.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::capability::{Capability, MEDIA_PLACEHOLDER};
use crate::error::OutputDefect;
use crate::model::{ModelClient, ModelRequest, PromptPart};
use crate::models::{AnalysisRequest, AnalysisResult};
use crate::{Error, Result};

/// A capability bound to a model client.
///
/// Holds no per-request state, so one flow may serve concurrent requests.
pub struct PromptFlow<M> {
    client: Arc<M>,
    capability: &'static Capability,
}

impl<M> Clone for PromptFlow<M> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            capability: self.capability,
        }
    }
}

impl<M: ModelClient> PromptFlow<M> {
    pub fn new(client: Arc<M>, capability: &'static Capability) -> Self {
        Self { client, capability }
    }

    pub fn capability(&self) -> &'static Capability {
        self.capability
    }

    /// Run one analysis. Performs exactly one model call.
    pub async fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.capability
            .input
            .validate(&request.to_input())
            .map_err(Error::InputInvalid)?;

        let model_request = self.render(request);
        info!(
            capability = self.capability.name,
            media_type = request.image.media_type().as_mime(),
            bytes = request.image.len(),
            "Invoking model"
        );

        let reply = self.client.converse(model_request).await?;
        let result = self.parse_reply(reply.as_deref())?;

        debug!(capability = self.capability.name, mood = %result.mood, "Model output accepted");
        Ok(result)
    }

    /// Interpolate the image into the instruction and attach the reply contract.
    pub fn render(&self, request: &AnalysisRequest) -> ModelRequest {
        let mut parts = Vec::with_capacity(3);
        let (before, after) = self
            .capability
            .instruction
            .split_once(MEDIA_PLACEHOLDER)
            .unwrap_or((self.capability.instruction, ""));

        if !before.trim().is_empty() {
            parts.push(PromptPart::Text(before.trim_end().to_string()));
        }
        parts.push(PromptPart::Image(request.image.clone()));
        if !after.trim().is_empty() {
            parts.push(PromptPart::Text(after.trim().to_string()));
        }

        let system = format!(
            "Respond with only a JSON object, without markdown or commentary, containing exactly these fields:\n{}\n\nThe object must match this JSON Schema:\n{}",
            self.capability.output.describe_fields(),
            self.capability.output.to_json_schema()
        );

        ModelRequest { system, parts }
    }

    fn parse_reply(&self, reply: Option<&str>) -> Result<AnalysisResult> {
        let text = reply
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(OutputDefect::Missing)?;

        let object = extract_json_object(text)
            .ok_or_else(|| OutputDefect::Malformed(preview(text)))?;
        let value: Value = serde_json::from_str(object)
            .map_err(|e| OutputDefect::Malformed(e.to_string()))?;

        let validated = self
            .capability
            .output
            .validate(&value)
            .map_err(OutputDefect::Schema)?;

        Ok(serde_json::from_value(Value::Object(validated))?)
    }
}

/// Locate the outermost JSON object in free-form model text.
///
/// Tolerates markdown fences and prose around the object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 80;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
