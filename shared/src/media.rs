//! Image payloads carried as `data:<mime>;base64,<data>` URIs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Image media types the model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMediaType {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageMediaType {
    /// Parse a MIME type such as `image/jpeg`. Parameters and case are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Some(ImageMediaType::Png),
            "image/jpeg" | "image/jpg" => Some(ImageMediaType::Jpeg),
            "image/gif" => Some(ImageMediaType::Gif),
            "image/webp" => Some(ImageMediaType::Webp),
            _ => None,
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            ImageMediaType::Png => "image/png",
            ImageMediaType::Jpeg => "image/jpeg",
            ImageMediaType::Gif => "image/gif",
            ImageMediaType::Webp => "image/webp",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            ImageMediaType::Png => ImageFormat::Png,
            ImageMediaType::Jpeg => ImageFormat::Jpeg,
            ImageMediaType::Gif => ImageFormat::Gif,
            ImageMediaType::Webp => ImageFormat::WebP,
        }
    }
}

/// A decoded image whose declared media type matches its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    media_type: ImageMediaType,
    bytes: Vec<u8>,
    data_uri: String,
}

impl ImagePayload {
    /// Parse and check a data URI.
    ///
    /// Rejects URIs without a media type, without base64 encoding, with an
    /// unsupported media type, or whose bytes are not the declared format.
    pub fn from_data_uri(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let rest = raw
            .strip_prefix("data:")
            .ok_or_else(|| Error::InvalidPayload("expected a data: URI".to_string()))?;
        let (header, encoded) = rest
            .split_once(',')
            .ok_or_else(|| Error::InvalidPayload("missing ',' separator".to_string()))?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default().trim();
        if mime.is_empty() {
            return Err(Error::InvalidPayload("missing media type".to_string()));
        }
        if !params.any(|param| param.trim().eq_ignore_ascii_case("base64")) {
            return Err(Error::InvalidPayload("payload is not base64 encoded".to_string()));
        }
        let media_type = ImageMediaType::from_mime(mime)
            .ok_or_else(|| Error::InvalidPayload(format!("unsupported media type '{}'", mime)))?;

        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidPayload(format!("base64 decode failed: {}", e)))?;

        Self::checked(media_type, bytes, raw.to_string())
    }

    /// Build a payload from raw file bytes.
    pub fn from_bytes(media_type: ImageMediaType, bytes: Vec<u8>) -> Result<Self> {
        let data_uri = format!("data:{};base64,{}", media_type.as_mime(), BASE64.encode(&bytes));
        Self::checked(media_type, bytes, data_uri)
    }

    fn checked(media_type: ImageMediaType, bytes: Vec<u8>, data_uri: String) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidPayload("image is empty".to_string()));
        }
        match image::guess_format(&bytes) {
            Ok(format) if format == media_type.image_format() => Ok(Self {
                media_type,
                bytes,
                data_uri,
            }),
            Ok(format) => Err(Error::InvalidPayload(format!(
                "declared {} but content is {:?}",
                media_type.as_mime(),
                format
            ))),
            Err(_) => Err(Error::InvalidPayload(format!(
                "content is not a recognizable {}",
                media_type.as_mime()
            ))),
        }
    }

    pub fn media_type(&self) -> ImageMediaType {
        self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
