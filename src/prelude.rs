//! # Prelude for the video-summarizer crate
//!
//! Re-exports the types needed to run a summary:
//!
//! ```rust,ignore
//! use video_summarizer::prelude::*;
//! ```

pub use crate::client::{Error as ClientError, Gemini};
pub use crate::files::{FileBuilder, FileHandle};
pub use crate::generation::{ContentBuilder, GenerationConfig, GenerationResponse};
pub use crate::models::{Content, Part, Role};
pub use crate::summary::{
    CleanupOutcome, CleanupPolicy, Error as SummaryError, GeminiService, RemoteFileHandle,
    RunReport, Summarizer, SummaryConfig, VideoService,
};
