//! Run configuration, built once at process start and passed by reference.

use mime::Mime;
use std::{path::PathBuf, time::Duration};
use tracing::warn;
use url::Url;

use crate::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::generation::GenerationConfig;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Used when no API key is configured; every remote call will then fail authentication.
pub const API_KEY_PLACEHOLDER: &str = "insert api key";

pub const DEFAULT_OUTPUT_FILE: &str = "summary.txt";

pub const DEFAULT_PROMPT: &str = "Analyze the provided CCTV footage and generate a concise summary of the events occurring in the video. \
Focus on key activities, movements, or notable occurrences. Do not make assumptions beyond what is visible. \
Provide the summary in a clear, chronological order, and limit it to 3-5 sentences.";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(600);

/// What to do when deleting the uploaded video fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanupPolicy {
    /// Log a warning and report the run as successful.
    #[default]
    Warn,
    /// Fail the run.
    Fail,
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub api_key: String,
    pub base_url: Url,
    /// Model identifier, e.g. `models/gemini-1.5-flash`.
    pub model: String,
    pub prompt: String,
    /// Media type declared for the uploaded video.
    pub mime_type: Mime,
    pub output_path: PathBuf,
    /// How often to check whether the uploaded video finished processing.
    pub poll_interval: Duration,
    /// Give up waiting for processing after this long; `None` waits forever.
    pub processing_timeout: Option<Duration>,
    pub cleanup_policy: CleanupPolicy,
    pub generation_config: Option<GenerationConfig>,
}

impl SummaryConfig {
    /// Configuration with every default and the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            mime_type: video_mp4(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            poll_interval: DEFAULT_POLL_INTERVAL,
            processing_timeout: Some(DEFAULT_PROCESSING_TIMEOUT),
            cleanup_policy: CleanupPolicy::default(),
            generation_config: None,
        }
    }

    /// Use the given key, or fall back to the placeholder with a warning.
    pub fn with_api_key_or_placeholder(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty()).unwrap_or_else(|| {
            warn!(
                env = API_KEY_ENV,
                "no API key configured, remote calls will fail authentication"
            );
            API_KEY_PLACEHOLDER.to_string()
        });
        Self::new(api_key)
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_mime_type(mut self, mime_type: Mime) -> Self {
        self.mime_type = mime_type;
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_processing_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.processing_timeout = timeout;
        self
    }

    pub fn with_cleanup_policy(mut self, cleanup_policy: CleanupPolicy) -> Self {
        self.cleanup_policy = cleanup_policy;
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

fn video_mp4() -> Mime {
    "video/mp4".parse().expect("video/mp4 is a valid media type")
}
