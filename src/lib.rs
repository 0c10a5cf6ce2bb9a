//! # video-summarizer
//!
//! Summarize the visible events of a video with Google Gemini.
//!
//! The crate contains a small client for the parts of the Gemini API a run
//! needs (file upload, generation, file deletion) and the [`summary`]
//! pipeline built on top of it.

mod client;
mod common;
pub mod files;
pub mod generation;
mod models;
pub mod prelude;
pub mod summary;


pub use client::{Error as ClientError, Gemini, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use files::{File, FileBuilder, FileHandle, FileState};
pub use generation::{
    Candidate, ContentBuilder, FinishReason, GenerateContentRequest, GenerationConfig,
    GenerationResponse, UsageMetadata,
};
pub use models::{Content, FileData, Part, Role};
