use std::path::Path;

use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("Please select a valid image file.")]
    NotAnImage,
    #[error("could not read image file: {0}")]
    Unreadable(String),
}

/// A validated image attachment, held as raw bytes until submit time.
#[derive(Debug, Clone)]
pub struct Attachment {
    mime: String,
    bytes: Vec<u8>,
}

impl Attachment {
    /// Accepts only `image/*` content types. Anything else is rejected
    /// before any session state changes hands.
    pub fn new(mime: &str, bytes: Vec<u8>) -> Result<Self, AttachmentError> {
        if !mime.starts_with("image/") {
            return Err(AttachmentError::NotAnImage);
        }
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    /// Loads an image from disk for the terminal client, guessing the MIME
    /// type from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let mime = mime_for_extension(path).ok_or(AttachmentError::NotAnImage)?;
        let bytes =
            std::fs::read(path).map_err(|e| AttachmentError::Unreadable(e.to_string()))?;
        Self::new(mime, bytes)
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Base64 data URL, the portable form the completion API accepts.
    /// Files are encoded whole; no size cap is enforced.
    pub fn data_url(&self) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime, payload)
    }
}

fn mime_for_extension(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
