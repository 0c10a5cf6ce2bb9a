//! The four-step run: upload, summarize, write, clean up.
//!
//! A run moves through [`RunState`] strictly in order. The first failing step
//! ends the run; nothing is retried and later steps are not attempted.

use display_error_chain::DisplayErrorChain;
use snafu::{ensure, ResultExt, Snafu};
use std::io;
use std::path::{Path, PathBuf};
use strum::Display;
use tracing::{debug, error, info, instrument, warn};

use crate::summary::config::{CleanupPolicy, SummaryConfig};
use crate::summary::service::{RemoteFileHandle, ServiceError, VideoService};
use crate::summary::writer::write_summary;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("video file '{}' not found", path.display()))]
    LocalFileMissing { path: PathBuf },

    #[snafu(display("failed to read video file '{}'", path.display()))]
    ReadVideo { source: io::Error, path: PathBuf },

    #[snafu(display("failed to upload video '{}'", path.display()))]
    Upload {
        source: ServiceError,
        path: PathBuf,
    },

    #[snafu(display("failed to generate a summary for '{uri}'"))]
    Generate { source: ServiceError, uri: String },

    #[snafu(display("model '{model}' returned no usable text"))]
    EmptyResponse { model: String },

    #[snafu(display("failed to write summary to '{}'", path.display()))]
    Write { source: io::Error, path: PathBuf },

    #[snafu(display("failed to delete uploaded file '{id}'"))]
    Cleanup { source: ServiceError, id: String },
}

impl Error {
    /// The pipeline step that produced this error.
    pub fn step(&self) -> Step {
        match self {
            Error::LocalFileMissing { .. } | Error::ReadVideo { .. } | Error::Upload { .. } => {
                Step::Upload
            }
            Error::Generate { .. } | Error::EmptyResponse { .. } => Step::Summarize,
            Error::Write { .. } => Step::Write,
            Error::Cleanup { .. } => Step::Cleanup,
        }
    }
}

/// A step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Step {
    Upload,
    Summarize,
    Write,
    Cleanup,
}

/// Progress of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RunState {
    Start,
    Uploaded,
    Summarized,
    Written,
    Deleted,
    Done,
    Failed,
}

/// How the final delete went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted,
    /// Deleting failed and the policy let the run succeed anyway.
    Failed(String),
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub uri: String,
    pub id: String,
    pub summary: String,
    pub output_path: PathBuf,
    pub cleanup: CleanupOutcome,
}

/// Runs the pipeline for one video against a [`VideoService`].
pub struct Summarizer<'a, S: ?Sized> {
    service: &'a S,
    config: &'a SummaryConfig,
}

impl<'a, S: VideoService + ?Sized> Summarizer<'a, S> {
    pub fn new(service: &'a S, config: &'a SummaryConfig) -> Self {
        Self { service, config }
    }

    /// Upload, summarize, write and delete, in that order.
    #[instrument(skip_all, fields(video = %video.display()))]
    pub async fn run(&self, video: &Path) -> Result<RunReport, Error> {
        let result = self.run_steps(video).await;
        if let Err(e) = &result {
            error!(step = %e.step(), state = %RunState::Failed, error = %e, "run aborted");
        }
        result
    }

    async fn run_steps(&self, video: &Path) -> Result<RunReport, Error> {
        debug!(state = %RunState::Start, "state changed");

        let file = self.upload(video).await?;
        debug!(state = %RunState::Uploaded, "state changed");

        let summary = self.summarize(&file).await?;
        debug!(state = %RunState::Summarized, "state changed");

        self.save(&summary).await?;
        debug!(state = %RunState::Written, "state changed");

        let uri = file.uri.clone();
        let id = file.id.clone();
        let cleanup = match self.cleanup(file).await {
            Ok(()) => {
                debug!(state = %RunState::Deleted, "state changed");
                CleanupOutcome::Deleted
            }
            Err(e) if self.config.cleanup_policy == CleanupPolicy::Warn => {
                let chain = DisplayErrorChain::new(&e).to_string();
                warn!(error = %chain, "could not delete the uploaded video, continuing");
                CleanupOutcome::Failed(chain)
            }
            Err(e) => return Err(e),
        };

        debug!(state = %RunState::Done, "state changed");
        Ok(RunReport {
            uri,
            id,
            summary,
            output_path: self.config.output_path.clone(),
            cleanup,
        })
    }

    /// Check that `video` is an existing file and hand its bytes to the service.
    pub async fn upload(&self, video: &Path) -> Result<RemoteFileHandle, Error> {
        let metadata = match tokio::fs::metadata(video).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return LocalFileMissingSnafu { path: video }.fail();
            }
            Err(e) => return Err(e).context(ReadVideoSnafu { path: video }),
        };
        ensure!(metadata.is_file(), LocalFileMissingSnafu { path: video });

        info!(size = metadata.len(), mime_type = %self.config.mime_type, "uploading video");
        let bytes = tokio::fs::read(video)
            .await
            .context(ReadVideoSnafu { path: video })?;

        let display_name = video
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| video.display().to_string());

        let file = self
            .service
            .upload(&display_name, bytes, &self.config.mime_type)
            .await
            .context(UploadSnafu { path: video })?;

        info!(file.uri = %file.uri, file.id = %file.id, "uploaded video");
        Ok(file)
    }

    /// Ask the model for a summary; the result is trimmed and never empty.
    pub async fn summarize(&self, file: &RemoteFileHandle) -> Result<String, Error> {
        info!(model = %self.config.model, "generating summary");
        let text = self
            .service
            .infer(&self.config.model, &self.config.prompt, file)
            .await
            .context(GenerateSnafu {
                uri: file.uri.as_str(),
            })?;

        let summary = text.trim();
        ensure!(
            !summary.is_empty(),
            EmptyResponseSnafu {
                model: self.config.model.as_str(),
            }
        );

        info!(chars = summary.chars().count(), "summary generated");
        Ok(summary.to_string())
    }

    /// Overwrite the configured output file with `summary`.
    pub async fn save(&self, summary: &str) -> Result<(), Error> {
        let path = &self.config.output_path;
        write_summary(path, summary)
            .await
            .context(WriteSnafu { path })?;

        info!(output = %path.display(), "summary saved");
        Ok(())
    }

    /// Delete the uploaded file. The handle is consumed either way.
    pub async fn cleanup(&self, file: RemoteFileHandle) -> Result<(), Error> {
        self.service
            .delete(&file.id)
            .await
            .context(CleanupSnafu {
                id: file.id.as_str(),
            })?;

        info!(file.id = %file.id, "deleted uploaded video");
        Ok(())
    }
}
