//! Shared library for AnimalMoji.
//!
//! This crate provides the schema contracts, model flow, request facade and
//! client session used by the Lambda functions.

pub mod capability;
pub mod config;
pub mod driver;
pub mod error;
pub mod facade;
pub mod flow;
pub mod http;
pub mod media;
pub mod model;
pub mod models;
pub mod schema;
pub mod session;

#[cfg(test)]
mod testing;

pub use capability::Capability;
pub use config::Config;
pub use driver::{SessionDriver, SessionHandle};
pub use error::{Error, OutputDefect, Result};
pub use facade::AnalysisFacade;
pub use flow::PromptFlow;
pub use http::ApiResponse;
pub use media::{ImageMediaType, ImagePayload};
pub use model::{BedrockModelClient, ModelClient, ModelRequest, PromptPart};
pub use models::{AnalysisRequest, AnalysisResult, AnalyzeRequest, ResultEnvelope};
pub use schema::{FieldKind, FieldSpec, ObjectSchema, SchemaViolation};
pub use session::{InteractionState, SelectedFile, Session, SessionSnapshot};
