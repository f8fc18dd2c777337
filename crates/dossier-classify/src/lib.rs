//! Automated department classification for uploaded documents.
//!
//! - [`prompt`] builds the instruction sent alongside the file.
//! - [`client`] defines the [`Classifier`] seam and the Gemini-backed
//!   implementation.
//! - [`reply`] turns the loosely structured reply text into a ranked label.
//! - [`pipeline`] ties them to the store and storage as a background task.

#![allow(async_fn_in_trait)]

pub mod client;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod reply;

pub use client::{ClassifierConfig, ClassifyRequest, Classifier, GeminiClassifier};
pub use error::{Error, Result};
pub use pipeline::ClassificationPipeline;
