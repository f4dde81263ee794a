//! Boundary between untrusted callers and the prompt flow.
//!
//! Every outcome is reported through a [`ResultEnvelope`]; internal failure
//! detail is logged here and never handed to the caller.

use tracing::{error, info, warn};

use crate::flow::PromptFlow;
use crate::media::ImagePayload;
use crate::model::ModelClient;
use crate::models::{AnalysisRequest, ResultEnvelope};
use crate::Error;

/// Returned when no payload was supplied.
pub const NO_PHOTO_MESSAGE: &str = "No photo data provided.";

/// Returned for every other failure.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Could not analyze the photo. Please try another one.";

/// Request facade for a single capability.
pub struct AnalysisFacade<M> {
    flow: PromptFlow<M>,
}

impl<M: ModelClient> AnalysisFacade<M> {
    pub fn new(flow: PromptFlow<M>) -> Self {
        Self { flow }
    }

    /// Analyze a raw data URI.
    pub async fn analyze(&self, raw: Option<&str>) -> ResultEnvelope {
        let capability = self.flow.capability().name;

        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                info!(capability, error = %Error::InputMissing, "Rejected analysis without photo data");
                return ResultEnvelope::failure(NO_PHOTO_MESSAGE);
            }
        };

        let image = match ImagePayload::from_data_uri(raw) {
            Ok(image) => image,
            Err(e) => {
                warn!(capability, error = %e, "Rejected photo payload");
                return ResultEnvelope::failure(ANALYSIS_FAILED_MESSAGE);
            }
        };

        match self.flow.invoke(&AnalysisRequest::new(image)).await {
            Ok(result) => {
                info!(capability, "Analysis succeeded");
                ResultEnvelope::Success(result)
            }
            Err(Error::ModelOutputInvalid(defect)) => {
                error!(capability, defect = defect.kind(), error = %defect, "Model output rejected");
                ResultEnvelope::failure(ANALYSIS_FAILED_MESSAGE)
            }
            Err(e) => {
                error!(capability, error = %e, "Analysis failed");
                ResultEnvelope::failure(ANALYSIS_FAILED_MESSAGE)
            }
        }
    }
}
