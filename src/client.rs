use crate::{
    files::{
        model::{CreateFileRequest, File, FileMetadata, UploadFileResponse},
        FileBuilder,
    },
    generation::{ContentBuilder, GenerateContentRequest, GenerationResponse},
};
use mime::Mime;
use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue},
    Client, ClientBuilder, Response,
};
use snafu::{OptionExt, ResultExt, Snafu};
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_MODEL: &str = "models/gemini-1.5-flash";

const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("API key is not a valid header value"))]
    InvalidApiKey { source: InvalidHeaderValue },

    #[snafu(display("failed to build HTTP client"))]
    BuildHttpClient { source: reqwest::Error },

    #[snafu(display("failed to construct URL (probably incorrect model or file name): {suffix}"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// HTTP error description
        description: Option<String>,
    },

    #[snafu(display("failed to decode response body"))]
    DecodeResponse { source: reqwest::Error },

    #[snafu(display("response is missing the '{header}' header"))]
    MissingResponseHeader { header: String },

    #[snafu(display("response header '{header}' does not hold a valid URL"))]
    InvalidResponseHeader { header: String },

    #[snafu(display("file '{name}' is missing its {field}"))]
    IncompleteFileMetadata { name: String, field: String },

    #[snafu(display(
        "file '{name}' failed processing: {}",
        message.as_deref().unwrap_or("no details")
    ))]
    FileProcessingFailed {
        name: String,
        message: Option<String>,
    },

    #[snafu(display("file '{name}' did not finish processing within {timeout:?}"))]
    FileProcessingTimeout { name: String, timeout: Duration },
}

/// Internal client for making requests to the Gemini API
#[derive(Debug)]
pub(crate) struct GeminiClient {
    http_client: Client,
    pub model: String,
    base_url: Url,
}

impl GeminiClient {
    /// Create a new client with custom base URL
    fn with_base_url(api_key: &str, model: String, mut base_url: Url) -> Result<Self, Error> {
        // relative joins drop the last segment unless the path ends in a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut api_key = HeaderValue::from_str(api_key).context(InvalidApiKeySnafu)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", api_key);

        let http_client = ClientBuilder::new()
            .default_headers(headers)
            .build()
            .context(BuildHttpClientSnafu)?;

        Ok(Self {
            http_client,
            model: normalize_model(model),
            base_url,
        })
    }

    /// Generate content with the given model
    #[instrument(skip_all, fields(model = %model))]
    pub(crate) async fn generate_content_raw(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let url = self.build_url(&format!("{model}:generateContent"))?;

        let response = self
            .http_client
            .post(url.clone())
            .json(&request)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;

        let response = Self::check_response(response).await?;
        response.json().await.context(DecodeResponseSnafu)
    }

    /// Upload a file with the resumable protocol: open a session, then send
    /// the bytes and finalize in one request.
    #[instrument(skip_all, fields(
        file.size = file_bytes.len(),
        mime.type = %mime_type,
    ))]
    pub(crate) async fn upload_file(
        &self,
        display_name: Option<String>,
        file_bytes: Vec<u8>,
        mime_type: Mime,
    ) -> Result<File, Error> {
        let url = self.build_upload_url()?;
        let request = CreateFileRequest {
            file: FileMetadata { display_name },
        };

        let response = self
            .http_client
            .post(url.clone())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header(
                "X-Goog-Upload-Header-Content-Length",
                file_bytes.len().to_string(),
            )
            .header("X-Goog-Upload-Header-Content-Type", mime_type.to_string())
            .json(&request)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;

        let response = Self::check_response(response).await?;
        let session_url = response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .context(MissingResponseHeaderSnafu {
                header: UPLOAD_URL_HEADER,
            })?
            .to_str()
            .ok()
            .and_then(|value| Url::parse(value).ok())
            .context(InvalidResponseHeaderSnafu {
                header: UPLOAD_URL_HEADER,
            })?;

        debug!("upload session opened");

        let response = self
            .http_client
            .post(session_url.clone())
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", "0")
            .body(file_bytes)
            .send()
            .await
            .context(PerformRequestSnafu { url: session_url })?;

        let response = Self::check_response(response).await?;
        let uploaded: UploadFileResponse = response.json().await.context(DecodeResponseSnafu)?;
        Ok(uploaded.file)
    }

    /// Get file metadata
    pub(crate) async fn get_file(&self, name: &str) -> Result<File, Error> {
        let url = self.build_url(name)?;

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .context(PerformRequestSnafu { url })?;

        let response = Self::check_response(response).await?;
        response.json().await.context(DecodeResponseSnafu)
    }

    /// Delete a file
    pub(crate) async fn delete_file(&self, name: &str) -> Result<(), Error> {
        let url = self.build_url(name)?;

        let response = self
            .http_client
            .delete(url.clone())
            .send()
            .await
            .context(PerformRequestSnafu { url })?;

        Self::check_response(response).await?;
        Ok(())
    }

    async fn check_response(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.ok();
            return BadResponseSnafu {
                code: status.as_u16(),
                description,
            }
            .fail();
        }
        Ok(response)
    }

    /// Build a URL for the API
    fn build_url(&self, suffix: &str) -> Result<Url, Error> {
        self.base_url
            .join(suffix)
            .context(ConstructUrlSnafu { suffix })
    }

    /// Build the media upload URL; uploads live under `/upload` next to the API version.
    fn build_upload_url(&self) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        let path = format!("/upload{}", self.base_url.path());
        url.set_path(&path);
        url.join("files")
            .context(ConstructUrlSnafu { suffix: "files" })
    }
}

/// Prefix a bare model name such as `gemini-1.5-flash` with `models/`.
pub(crate) fn normalize_model(model: String) -> String {
    if model.starts_with("models/") {
        model
    } else {
        format!("models/{model}")
    }
}

/// Client for the Gemini API
#[derive(Clone, Debug)]
pub struct Gemini {
    client: Arc<GeminiClient>,
}

impl Gemini {
    /// Create a new client with the specified API key, default model and base URL.
    ///
    /// The base URL is the API version root, e.g. [`DEFAULT_BASE_URL`].
    pub fn with_model_and_base_url(
        api_key: impl AsRef<str>,
        model: impl Into<String>,
        base_url: Url,
    ) -> Result<Self, Error> {
        let client = GeminiClient::with_base_url(api_key.as_ref(), model.into(), base_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Start building a content generation request
    pub fn generate_content(&self) -> ContentBuilder {
        ContentBuilder::new(self.client.clone())
    }

    /// Start building a file upload
    pub fn create_file<B: Into<Vec<u8>>>(&self, bytes: B) -> FileBuilder {
        FileBuilder::new(self.client.clone(), bytes)
    }

    /// Delete an uploaded file by its resource name (`files/...`).
    #[instrument(skip_all, fields(file.name = %name))]
    pub async fn delete_file(&self, name: &str) -> Result<(), Error> {
        self.client.delete_file(name).await
    }
}
