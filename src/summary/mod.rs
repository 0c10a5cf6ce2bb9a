//! Summarize one video: upload it, ask the model to describe it, save the
//! answer and delete the upload.
//!
//! ## Example usage:
//! ```rust,ignore
//! use std::path::Path;
//! use video_summarizer::summary::{GeminiService, Summarizer, SummaryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SummaryConfig::new(std::env::var("GOOGLE_API_KEY")?);
//!     let service = GeminiService::from_config(&config)?;
//!
//!     let report = Summarizer::new(&service, &config)
//!         .run(Path::new("sample.mp4"))
//!         .await?;
//!
//!     println!("{}", report.summary);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod pipeline;
pub mod service;
pub mod writer;

pub use config::{CleanupPolicy, SummaryConfig};
pub use pipeline::{CleanupOutcome, Error, RunReport, RunState, Step, Summarizer};
pub use service::{GeminiService, RemoteFileHandle, ServiceError, VideoService};
pub use writer::write_summary;
