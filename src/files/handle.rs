use snafu::OptionExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

use crate::client::{
    Error, FileProcessingFailedSnafu, FileProcessingTimeoutSnafu, GeminiClient,
    IncompleteFileMetadataSnafu,
};
use crate::files::model::{File, FileState};

/// A handle to a file stored by the Gemini API.
///
/// Video files are processed asynchronously after upload; use
/// [`wait_until_active`](Self::wait_until_active) before referencing one in a
/// generation request.
#[derive(Debug, Clone)]
pub struct FileHandle {
    client: Arc<GeminiClient>,
    file: File,
}

impl FileHandle {
    pub(crate) fn new(client: Arc<GeminiClient>, file: File) -> Self {
        Self { client, file }
    }

    /// The resource name, e.g. `files/abc-123`.
    pub fn name(&self) -> &str {
        &self.file.name
    }

    pub fn get_file_meta(&self) -> &File {
        &self.file
    }

    pub fn state(&self) -> Option<FileState> {
        self.file.state
    }

    /// The file URI, or an error if the service did not report one.
    pub fn uri(&self) -> Result<&Url, Error> {
        self.file.uri.as_ref().context(IncompleteFileMetadataSnafu {
            name: self.file.name.as_str(),
            field: "uri",
        })
    }

    /// The file MIME type, or an error if the service did not report one.
    pub fn mime_type(&self) -> Result<&mime::Mime, Error> {
        self.file
            .mime_type
            .as_ref()
            .context(IncompleteFileMetadataSnafu {
                name: self.file.name.as_str(),
                field: "mime type",
            })
    }

    /// Re-fetch the file metadata.
    #[instrument(skip_all, fields(file.name = %self.file.name))]
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.file = self.client.get_file(&self.file.name).await?;
        debug!(
            state = self.file.state.as_ref().map_or("UNKNOWN", |s| s.as_ref()),
            "file metadata refreshed"
        );
        Ok(())
    }

    /// Poll the file until it leaves the `PROCESSING` state.
    ///
    /// Returns an error if processing fails or `timeout` elapses first.
    #[instrument(skip_all, fields(
        file.name = %self.file.name,
        poll.interval.ms = interval.as_millis() as u64,
        timeout.secs = timeout.as_ref().map(|d| d.as_secs()),
    ))]
    pub async fn wait_until_active(
        &mut self,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<(), Error> {
        let start = Instant::now();

        loop {
            match self.file.state {
                Some(FileState::Processing) => {}
                Some(FileState::Failed) => {
                    return FileProcessingFailedSnafu {
                        name: self.file.name.as_str(),
                        message: self.file.error.as_ref().map(|e| e.message.clone()),
                    }
                    .fail();
                }
                _ => return Ok(()),
            }

            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    return FileProcessingTimeoutSnafu {
                        name: self.file.name.as_str(),
                        timeout,
                    }
                    .fail();
                }
            }

            debug!("file is still processing");
            tokio::time::sleep(interval).await;
            self.refresh().await?;
        }
    }
}
