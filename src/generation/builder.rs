use std::sync::Arc;
use tracing::instrument;

use crate::{
    client::{normalize_model, Error as ClientError, GeminiClient},
    generation::{GenerateContentRequest, GenerationConfig, GenerationResponse},
    models::{Content, Role},
};

/// Builder for a `generateContent` request about uploaded files.
#[derive(Clone)]
pub struct ContentBuilder {
    client: Arc<GeminiClient>,
    model: Option<String>,
    pub contents: Vec<Content>,
    generation_config: Option<GenerationConfig>,
}

impl ContentBuilder {
    pub(crate) fn new(client: Arc<GeminiClient>) -> Self {
        Self {
            client,
            model: None,
            contents: Vec::new(),
            generation_config: None,
        }
    }

    /// Send the request to `model` instead of the client's default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(normalize_model(model.into()));
        self
    }

    /// Adds a user turn made of `text` followed by a reference to an uploaded file.
    pub fn with_user_message_and_file_uri(
        mut self,
        text: impl Into<String>,
        mime_type: impl Into<String>,
        file_uri: impl Into<String>,
    ) -> Self {
        let content = Content::text_with_file_data(text, mime_type, file_uri).with_role(Role::User);
        self.contents.push(content);
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn build(self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.contents,
            generation_config: self.generation_config,
        }
    }

    /// Executes the request against the selected model.
    #[instrument(skip_all, fields(
        model = self.model.as_deref().unwrap_or(self.client.model.as_str()),
        contents.count = self.contents.len(),
    ))]
    pub async fn execute(self) -> Result<GenerationResponse, ClientError> {
        let client = self.client.clone();
        let model = self.model.clone().unwrap_or_else(|| client.model.clone());
        let request = self.build();
        client.generate_content_raw(&model, request).await
    }
}
