//! Client interaction state machine.
//!
//! `Idle -> Staged -> InFlight -> Resolved | Failed`, with at most one
//! analysis in flight. Each analysis carries a request id; completions whose
//! id is no longer the in-flight one are stale and dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::media::{ImageMediaType, ImagePayload};
use crate::models::{AnalysisResult, ResultEnvelope};
use crate::{Error, Result};

/// Validation notice shown when a selection is not an image.
pub const INVALID_FILE_NOTICE: &str = "Please select an image file (PNG, JPG, etc.).";

/// A file handed over by the picker.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Details recorded when an image is staged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub file_name: String,
    pub media_type: ImageMediaType,
    pub size_bytes: u64,
    /// Human-readable size, e.g. `2.00 MB`
    pub size_label: String,
    pub selected_at: DateTime<Utc>,
}

/// An image ready for analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedImage {
    pub data_uri: String,
    pub metadata: ImageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum InteractionState {
    Idle,
    Staged {
        image: StagedImage,
    },
    #[serde(rename_all = "camelCase")]
    InFlight {
        image: StagedImage,
        request_id: Uuid,
    },
    Resolved {
        image: StagedImage,
        result: AnalysisResult,
    },
    Failed {
        image: StagedImage,
        message: String,
    },
}

impl InteractionState {
    pub fn image(&self) -> Option<&StagedImage> {
        match self {
            InteractionState::Idle => None,
            InteractionState::Staged { image }
            | InteractionState::InFlight { image, .. }
            | InteractionState::Resolved { image, .. }
            | InteractionState::Failed { image, .. } => Some(image),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, InteractionState::InFlight { .. })
    }
}

/// Work order for one facade call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub request_id: Uuid,
    pub data_uri: String,
}

/// Cosmetic progress estimate while a request is in flight.
///
/// Eases toward 100 but holds at 99 until the real result arrives.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress(f64);

impl Progress {
    const CEILING: f64 = 99.0;
    const EASE: f64 = 0.05;

    pub fn value(&self) -> f64 {
        self.0
    }

    fn tick(&mut self) {
        let next = self.0 + (100.0 - self.0) * Self::EASE;
        self.0 = next.min(Self::CEILING);
    }

    fn finish(&mut self) {
        self.0 = 100.0;
    }
}

/// Read-only view for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub state: InteractionState,
    pub progress: f64,
    pub notice: Option<String>,
}

/// Owns the interaction state for one user.
#[derive(Debug)]
pub struct Session {
    state: InteractionState,
    progress: Progress,
    notice: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
            progress: Progress::default(),
            notice: None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            progress: self.progress.value(),
            notice: self.notice.clone(),
        }
    }

    /// Stage a picked file.
    ///
    /// A non-image leaves the state untouched and records a notice. A valid
    /// image replaces whatever was staged, which also orphans any in-flight
    /// request.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<()> {
        let media_type = match ImageMediaType::from_mime(&file.media_type) {
            Some(media_type) => media_type,
            None => {
                warn!(file_name = %file.name, media_type = %file.media_type, "Rejected non-image selection");
                self.notice = Some(INVALID_FILE_NOTICE.to_string());
                return Err(Error::InputTypeInvalid(file.media_type));
            }
        };

        let size_bytes = file.bytes.len() as u64;
        let payload = ImagePayload::from_bytes(media_type, file.bytes).map_err(|e| {
            self.notice = Some(INVALID_FILE_NOTICE.to_string());
            e
        })?;

        self.state = InteractionState::Staged {
            image: StagedImage {
                data_uri: payload.data_uri().to_string(),
                metadata: ImageMetadata {
                    file_name: file.name,
                    media_type,
                    size_bytes,
                    size_label: format_size(size_bytes),
                    selected_at: Utc::now(),
                },
            },
        };
        self.progress = Progress::default();
        self.notice = None;
        Ok(())
    }

    /// Start an analysis of the staged image.
    ///
    /// Returns the ticket to submit to the facade, or `None` when there is
    /// nothing to analyze or a request is already in flight.
    pub fn analyze(&mut self) -> Option<AnalysisTicket> {
        let image = match &self.state {
            InteractionState::Staged { image } | InteractionState::Failed { image, .. } => image.clone(),
            InteractionState::InFlight { request_id, .. } => {
                debug!(%request_id, "Analysis already in flight");
                return None;
            }
            InteractionState::Idle | InteractionState::Resolved { .. } => return None,
        };

        let request_id = Uuid::new_v4();
        let ticket = AnalysisTicket {
            request_id,
            data_uri: image.data_uri.clone(),
        };
        self.state = InteractionState::InFlight { image, request_id };
        self.progress = Progress::default();
        self.notice = None;
        Some(ticket)
    }

    /// Apply a facade result. Returns `false` when the completion is stale.
    pub fn complete(&mut self, request_id: Uuid, envelope: ResultEnvelope) -> bool {
        let image = match &self.state {
            InteractionState::InFlight {
                image,
                request_id: current,
            } if *current == request_id => image.clone(),
            _ => {
                debug!(%request_id, "Dropping stale analysis result");
                return false;
            }
        };

        self.state = match envelope {
            ResultEnvelope::Success(result) => InteractionState::Resolved { image, result },
            ResultEnvelope::Failure { message } => InteractionState::Failed { image, message },
        };
        self.progress.finish();
        true
    }

    /// Return to `Idle`, abandoning any staged image or in-flight request.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
        self.progress = Progress::default();
        self.notice = None;
    }

    /// Advance the cosmetic progress estimate.
    pub fn tick(&mut self) {
        if self.state.is_in_flight() {
            self.progress.tick();
        }
    }
}

/// Format a byte count as megabytes with two decimals.
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fixtures;

    fn jpeg(name: &str, len: usize) -> SelectedFile {
        SelectedFile {
            name: name.to_string(),
            media_type: "image/jpeg".to_string(),
            bytes: fixtures::jpeg_of_len(len),
        }
    }

    fn result(mood: &str) -> AnalysisResult {
        AnalysisResult {
            mood: mood.to_string(),
            symbol: None,
            commentary: None,
        }
    }

    fn staged() -> Session {
        let mut session = Session::new();
        session.select_file(jpeg("dog.jpg", 1024)).unwrap();
        session
    }

    #[test]
    fn test_select_records_metadata() {
        let mut session = Session::new();
        session.select_file(jpeg("cat.jpg", 2 * 1024 * 1024)).unwrap();

        let image = session.state().image().unwrap();
        assert_eq!(image.metadata.file_name, "cat.jpg");
        assert_eq!(image.metadata.size_label, "2.00 MB");
        assert_eq!(image.metadata.media_type, ImageMediaType::Jpeg);
        assert!(image.data_uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_non_image_selection_leaves_state_unchanged() {
        let mut session = staged();
        let before = session.state().clone();

        let err = session
            .select_file(SelectedFile {
                name: "notes.txt".to_string(),
                media_type: "text/plain".to_string(),
                bytes: b"hello".to_vec(),
            })
            .unwrap_err();

        assert!(matches!(err, Error::InputTypeInvalid(ref m) if m == "text/plain"));
        assert_eq!(session.state(), &before);
        assert_eq!(session.notice(), Some(INVALID_FILE_NOTICE));

        let mut idle = Session::new();
        assert!(idle.select_file(SelectedFile {
            name: "x.pdf".to_string(),
            media_type: "application/pdf".to_string(),
            bytes: vec![1],
        })
        .is_err());
        assert_eq!(idle.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_image_with_wrong_content_is_rejected() {
        let mut session = Session::new();
        let err = session
            .select_file(SelectedFile {
                name: "fake.png".to_string(),
                media_type: "image/png".to_string(),
                bytes: b"plain text".to_vec(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
        assert_eq!(session.state(), &InteractionState::Idle);
        assert!(session.notice().is_some());
    }

    #[test]
    fn test_analyze_only_from_staged_or_failed() {
        let mut session = Session::new();
        assert!(session.analyze().is_none());

        let mut session = staged();
        let ticket = session.analyze().unwrap();
        assert!(session.state().is_in_flight());

        assert!(session.analyze().is_none());
        assert!(matches!(
            session.state(),
            InteractionState::InFlight { request_id, .. } if *request_id == ticket.request_id
        ));

        assert!(session.complete(ticket.request_id, ResultEnvelope::Success(result("calm"))));
        assert!(session.analyze().is_none());
    }

    #[test]
    fn test_failure_keeps_image_for_retry() {
        let mut session = staged();
        let first = session.analyze().unwrap();
        assert!(session.complete(first.request_id, ResultEnvelope::failure("try again")));
        assert!(matches!(
            session.state(),
            InteractionState::Failed { message, .. } if message == "try again"
        ));

        let second = session.analyze().unwrap();
        assert_ne!(second.request_id, first.request_id);
        assert_eq!(second.data_uri, first.data_uri);
    }

    #[test]
    fn test_reset_during_flight_drops_late_result() {
        let mut session = staged();
        let ticket = session.analyze().unwrap();
        session.reset();

        assert!(!session.complete(ticket.request_id, ResultEnvelope::Success(result("late"))));
        assert_eq!(session.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_restage_during_flight_drops_late_result() {
        let mut session = staged();
        let ticket = session.analyze().unwrap();
        session.select_file(jpeg("other.jpg", 2048)).unwrap();

        assert!(!session.complete(ticket.request_id, ResultEnvelope::failure("late")));
        assert!(matches!(session.state(), InteractionState::Staged { .. }));
    }

    #[test]
    fn test_old_completion_ignored_while_newer_request_in_flight() {
        let mut session = staged();
        let old = session.analyze().unwrap();
        session.reset();
        session.select_file(jpeg("second.jpg", 4096)).unwrap();
        let new = session.analyze().unwrap();
        assert_ne!(old.request_id, new.request_id);

        assert!(!session.complete(old.request_id, ResultEnvelope::Success(result("stale"))));
        assert!(matches!(
            session.state(),
            InteractionState::InFlight { request_id, .. } if *request_id == new.request_id
        ));
        assert!(session.progress().value() < 100.0);

        assert!(session.complete(new.request_id, ResultEnvelope::Success(result("fresh"))));
        assert!(matches!(
            session.state(),
            InteractionState::Resolved { result, image } if result.mood == "fresh" && image.metadata.file_name == "second.jpg"
        ));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut session = Session::new();
        session.reset();
        session.reset();
        assert_eq!(session.state(), &InteractionState::Idle);

        let mut session = staged();
        session.reset();
        session.reset();
        assert_eq!(session.state(), &InteractionState::Idle);
        assert!(session.state().image().is_none());
    }

    #[test]
    fn test_progress_never_reaches_100_until_result() {
        let mut session = staged();
        let ticket = session.analyze().unwrap();

        let mut last = 0.0;
        for _ in 0..500 {
            session.tick();
            let value = session.progress().value();
            assert!(value >= last);
            assert!(value < 100.0);
            last = value;
        }
        assert_eq!(last, 99.0);

        session.complete(ticket.request_id, ResultEnvelope::Success(result("done")));
        assert_eq!(session.progress().value(), 100.0);

        session.tick();
        assert_eq!(session.progress().value(), 100.0);
    }

    #[test]
    fn test_snapshot_serializes_state_tag() {
        let session = staged();
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["state"], "staged");
        assert_eq!(json["image"]["metadata"]["fileName"], "dog.jpg");
        assert_eq!(json["progress"], 0.0);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(2 * 1024 * 1024), "2.00 MB");
        assert_eq!(format_size(512 * 1024), "0.50 MB");
        assert_eq!(format_size(0), "0.00 MB");
    }
}
