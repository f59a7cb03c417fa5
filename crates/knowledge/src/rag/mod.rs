//! Retrieval-augmented answering.
//!
//! Passages retrieved from the published snapshot are handed to a
//! [`GenerationProvider`] through a [`Synthesizer`], and the answer is
//! returned with highlighted source attributions.

pub mod answer;
pub mod generator;
pub mod synthesizer;
pub mod types;

pub use answer::answer;
pub use generator::{ExtractiveGenerator, GenerationProvider, LlmGenerator};
pub use synthesizer::Synthesizer;
pub use types::{AnswerResponse, AskRequest, SnippetOptions, SourceRef};
