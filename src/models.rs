//! # Core Gemini API Data Primitives
//!
//! `Content`, `Part` and `Role` are shared by generation requests and responses.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user
    User,
    /// Message from the model
    Model,
}

/// Content part that can be included in a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content
    Text {
        /// The text content
        text: String,
        /// Whether this is a thought summary (thinking models only)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Reference to a file uploaded through the Files API
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

/// URI based data for a message part
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// The MIME type of the referenced file
    pub mime_type: String,
    /// The URI returned by the upload
    pub file_uri: String,
}

/// Content of a message
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Parts of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
    /// Role of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Content {
    /// Create a content with a text part followed by a file reference
    pub fn text_with_file_data(
        text: impl Into<String>,
        mime_type: impl Into<String>,
        file_uri: impl Into<String>,
    ) -> Self {
        Self {
            parts: Some(vec![
                Part::Text {
                    text: text.into(),
                    thought: None,
                },
                Part::FileData {
                    file_data: FileData {
                        mime_type: mime_type.into(),
                        file_uri: file_uri.into(),
                    },
                },
            ]),
            role: None,
        }
    }

    /// Add a role to this content
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}
