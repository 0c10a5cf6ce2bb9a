//! The remote side of the pipeline, reduced to the three calls a run makes.

use async_trait::async_trait;
use mime::Mime;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::client::{Error as ClientError, Gemini};
use crate::generation::GenerationConfig;
use crate::summary::config::SummaryConfig;

/// Error type reported by a [`VideoService`].
pub type ServiceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A video stored by the remote service.
///
/// Cleanup consumes the handle, so a deleted file cannot be referenced again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileHandle {
    /// URI used to reference the file in an inference request.
    pub uri: String,
    /// Identifier used to delete the file (`files/...` for Gemini).
    pub id: String,
    /// Declared media type of the stored file.
    pub mime_type: Mime,
}

/// Upload, inference and deletion against a remote multimodal model.
#[async_trait]
pub trait VideoService: Send + Sync {
    /// Store `bytes` remotely under `display_name` with the declared media type.
    async fn upload(
        &self,
        display_name: &str,
        bytes: Vec<u8>,
        mime_type: &Mime,
    ) -> Result<RemoteFileHandle, ServiceError>;

    /// Ask `model` to answer `prompt` about the stored file; returns the raw text.
    async fn infer(
        &self,
        model: &str,
        prompt: &str,
        file: &RemoteFileHandle,
    ) -> Result<String, ServiceError>;

    /// Release the stored file.
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
}

/// [`VideoService`] backed by the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiService {
    client: Gemini,
    poll_interval: Duration,
    processing_timeout: Option<Duration>,
    generation_config: Option<GenerationConfig>,
}

impl GeminiService {
    /// Build the client and polling settings from a run configuration.
    pub fn from_config(config: &SummaryConfig) -> Result<Self, ClientError> {
        let client =
            Gemini::with_model_and_base_url(&config.api_key, &config.model, config.base_url.clone())?;
        Ok(Self {
            client,
            poll_interval: config.poll_interval,
            processing_timeout: config.processing_timeout,
            generation_config: config.generation_config.clone(),
        })
    }
}

#[async_trait]
impl VideoService for GeminiService {
    #[instrument(skip_all, fields(display_name = %display_name, file.size = bytes.len()))]
    async fn upload(
        &self,
        display_name: &str,
        bytes: Vec<u8>,
        mime_type: &Mime,
    ) -> Result<RemoteFileHandle, ServiceError> {
        let mut handle = self
            .client
            .create_file(bytes)
            .display_name(display_name)
            .with_mime_type(mime_type.clone())
            .upload()
            .await?;

        info!(
            file.name = handle.name(),
            state = ?handle.state(),
            "waiting for the service to process the video"
        );
        handle
            .wait_until_active(self.poll_interval, self.processing_timeout)
            .await?;

        let mime_type = handle
            .mime_type()
            .cloned()
            .unwrap_or_else(|_| mime_type.clone());
        Ok(RemoteFileHandle {
            uri: handle.uri()?.to_string(),
            id: handle.name().to_string(),
            mime_type,
        })
    }

    #[instrument(skip_all, fields(model = %model, file.uri = %file.uri))]
    async fn infer(
        &self,
        model: &str,
        prompt: &str,
        file: &RemoteFileHandle,
    ) -> Result<String, ServiceError> {
        let mut builder = self
            .client
            .generate_content()
            .with_model(model)
            .with_user_message_and_file_uri(prompt, file.mime_type.to_string(), file.uri.as_str());
        if let Some(config) = &self.generation_config {
            builder = builder.with_generation_config(config.clone());
        }

        let response = builder.execute().await?;
        let text = response.text();
        if text.trim().is_empty() {
            warn!(
                finish_reason = ?response.finish_reason(),
                block_reason = response.block_reason(),
                "model returned no text"
            );
        }
        Ok(text)
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.client.delete_file(id).await?;
        Ok(())
    }
}
