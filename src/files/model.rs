//! Data models for the Files API

use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use time::OffsetDateTime;
use url::Url;

use crate::common::serde::{i64_as_string, mime_as_string};

/// A file uploaded to the Gemini API.
///
/// Uploaded files are kept by the service for 48 hours unless deleted earlier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Resource name (e.g., "files/abc-123")
    pub name: String,

    /// Human-readable display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// MIME type of the file
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "mime_as_string::optional"
    )]
    pub mime_type: Option<mime::Mime>,

    /// Size in bytes
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "i64_as_string::optional"
    )]
    pub size_bytes: Option<i64>,

    /// Creation timestamp
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub create_time: Option<OffsetDateTime>,

    /// Last update timestamp
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub update_time: Option<OffsetDateTime>,

    /// When the service will drop the file on its own
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expiration_time: Option<OffsetDateTime>,

    /// Base64 encoded SHA-256 of the uploaded bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_hash: Option<String>,

    /// URI used to reference the file in generation requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<Url>,

    /// Processing state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FileState>,

    /// Set when processing failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,
}

/// The processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// Unknown state
    StateUnspecified,
    /// The file is still being processed and cannot be used for inference yet
    Processing,
    /// The file is ready to be used
    Active,
    /// Processing failed
    Failed,
}

/// Error status attached to a failed file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Body of the request that opens a resumable upload session.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateFileRequest {
    pub file: FileMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Response of the finalizing upload request.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadFileResponse {
    pub file: File,
}
