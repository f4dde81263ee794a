//! Bedrock client for invoking the vision model.

use std::future::Future;

use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ImageBlock, ImageFormat, ImageSource, InferenceConfiguration,
    Message, SystemContentBlock,
};
use aws_sdk_bedrockruntime::Client as BedrockClient;
use tracing::debug;

use crate::media::{ImageMediaType, ImagePayload};
use crate::{Config, Error, Result};

/// One piece of the user turn sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    Image(ImagePayload),
}

/// A fully rendered model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// System instructions, including the reply shape
    pub system: String,
    /// User turn content in order
    pub parts: Vec<PromptPart>,
}

/// The single outbound seam to a generative model.
///
/// Implementations make exactly one call attempt per `converse`. `Ok(None)`
/// means the model answered without any text.
pub trait ModelClient: Send + Sync {
    fn converse(&self, request: ModelRequest) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Model client backed by the Bedrock Converse API.
pub struct BedrockModelClient {
    client: BedrockClient,
    model_id: String,
    max_tokens: i32,
    temperature: f32,
}

impl BedrockModelClient {
    /// Create a new model client.
    pub fn new(client: BedrockClient, config: &Config) -> Self {
        Self {
            client,
            model_id: config.model_id.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Create a client from the default AWS credential chain.
    pub async fn from_config(config: &Config) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()))
            .load()
            .await;
        Self::new(BedrockClient::new(&sdk_config), config)
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn image_format(media_type: ImageMediaType) -> ImageFormat {
    match media_type {
        ImageMediaType::Png => ImageFormat::Png,
        ImageMediaType::Jpeg => ImageFormat::Jpeg,
        ImageMediaType::Gif => ImageFormat::Gif,
        ImageMediaType::Webp => ImageFormat::Webp,
    }
}

fn content_block(part: PromptPart) -> Result<ContentBlock> {
    match part {
        PromptPart::Text(text) => Ok(ContentBlock::Text(text)),
        PromptPart::Image(image) => {
            let block = ImageBlock::builder()
                .format(image_format(image.media_type()))
                .source(ImageSource::Bytes(Blob::new(image.bytes().to_vec())))
                .build()
                .map_err(|e| Error::Transport(format!("Failed to build image block: {}", e)))?;
            Ok(ContentBlock::Image(block))
        }
    }
}

impl ModelClient for BedrockModelClient {
    async fn converse(&self, request: ModelRequest) -> Result<Option<String>> {
        let mut message = Message::builder().role(ConversationRole::User);
        for part in request.parts {
            message = message.content(content_block(part)?);
        }
        let message = message
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build message: {}", e)))?;

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(request.system))
            .messages(message)
            .inference_config(
                InferenceConfiguration::builder()
                    .max_tokens(self.max_tokens)
                    .temperature(self.temperature)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to invoke model: {}", e)))?;

        debug!(stop_reason = ?response.stop_reason(), "Model call returned");

        let text = response
            .output()
            .and_then(|output| output.as_message().ok())
            .map(|message| {
                message
                    .content()
                    .iter()
                    .filter_map(|block| block.as_text().ok())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.trim().is_empty());

        Ok(text)
    }
}
