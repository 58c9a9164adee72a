//! Model client abstraction layer.
//!
//! Provides a trait-based interface over model transports:
//! - OpenAI-compatible chat completions
//! - Mock client for testing and offline runs

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockClient;
pub use openai::OpenAiClient;
pub use traits::{ClientError, Completion, CompletionMetadata, CompletionOptions, ModelClient, Usage};
