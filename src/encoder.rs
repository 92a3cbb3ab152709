use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, VidbookError};
use crate::frames::Frame;

/// Broad class of a media input, used to pick a fallback MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Video,
    Audio,
    Image,
    Text,
}

impl MediaClass {
    pub fn default_mime_type(&self) -> &'static str {
        match self {
            Self::Video => "video/mp4",
            Self::Audio => "audio/mpeg",
            Self::Image => "image/jpeg",
            Self::Text => "text/plain",
        }
    }

    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type.split('/').next()? {
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "image" => Some(Self::Image),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// MIME type for well known file extensions
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let mime = match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        _ => return None,
    };
    Some(mime)
}

/// A file read fully into memory, with its declared MIME type if known
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new<S: Into<String>>(name: S, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), mime_type, bytes }
    }

    /// Read a file from disk. A file that is missing or cannot be read to
    /// completion is an encoding failure.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await
            .map_err(|e| VidbookError::Encoding(format!("Failed to read {}: {}", path.display(), e)))?;

        let name = path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            mime_type: mime_type_for_path(path).map(str::to_string),
            bytes,
        })
    }

    /// Class from the declared MIME type, if any
    pub fn class(&self) -> Option<MediaClass> {
        self.mime_type.as_deref().and_then(MediaClass::from_mime_type)
    }

    /// Decode the content as UTF-8 text
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.bytes.clone())
            .map_err(|e| VidbookError::Encoding(format!("{} is not valid UTF-8 text: {}", self.name, e)))
    }
}

/// Attachment in the transport shape the generation client submits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPart {
    pub mime_type: String,
    /// Base64 encoded payload
    pub data: String,
}

/// Encode raw bytes, falling back to the class default when no MIME type is declared
pub fn encode_bytes(bytes: &[u8], declared_mime: Option<&str>, class: MediaClass) -> MediaPart {
    let mime_type = declared_mime
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| class.default_mime_type())
        .to_string();

    debug!("Encoding {} bytes as {}", bytes.len(), mime_type);

    MediaPart {
        mime_type,
        data: STANDARD.encode(bytes),
    }
}

pub fn encode_file(file: &MediaFile, class: MediaClass) -> MediaPart {
    encode_bytes(&file.bytes, file.mime_type.as_deref(), class)
}

pub fn encode_frame(frame: &Frame) -> MediaPart {
    encode_bytes(&frame.bytes, Some(&frame.mime_type), MediaClass::Image)
}
