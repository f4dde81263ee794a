//! Configuration management for the analysis service.

use std::env;

use crate::capability::Capability;
use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bedrock model identifier
    pub model_id: String,
    /// AWS region
    pub aws_region: String,
    /// Upper bound on reply tokens
    pub max_tokens: i32,
    /// Sampling temperature
    pub temperature: f32,
    /// Capability served when the route names none
    pub default_capability: &'static Capability,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_tokens = match lookup("MODEL_MAX_TOKENS") {
            Some(raw) => raw
                .parse::<i32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::Config(format!("MODEL_MAX_TOKENS must be a positive integer, got '{}'", raw)))?,
            None => 512,
        };

        let temperature = match lookup("MODEL_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .ok()
                .filter(|t| (0.0..=1.0).contains(t))
                .ok_or_else(|| Error::Config(format!("MODEL_TEMPERATURE must be within 0..=1, got '{}'", raw)))?,
            None => 0.4,
        };

        let default_capability = match lookup("DEFAULT_CAPABILITY") {
            Some(name) => Capability::by_name(&name)
                .ok_or_else(|| Error::Config(format!("Unknown capability '{}'", name)))?,
            None => Capability::default_capability(),
        };

        Ok(Self {
            model_id: lookup("BEDROCK_MODEL_ID")
                .unwrap_or_else(|| "anthropic.claude-3-haiku-20240307-v1:0".to_string()),
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            max_tokens,
            temperature,
            default_capability,
        })
    }
}
