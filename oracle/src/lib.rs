//! Logos Oracle - model judgments in, one deterministic interpretation out
//!
//! Provides:
//! - A trait-based model client capability (OpenAI-compatible, mock)
//! - A registry mapping model keys to clients
//! - The interpretation fusion engine (normalize, vote, score)
//! - Normalized Shannon entropy over raw judgments
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Orchestrator               │
//! │  (parallel calls, per-call timeouts)    │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌─────────────┐
//! │ ModelClient │       │   Fusion    │
//! │ (OpenAI/    │──────▶│  (vote +    │
//! │  Mock)      │ raws  │ confidence) │
//! └─────────────┘       └─────────────┘
//! ```

pub mod client;
pub mod entropy;
pub mod fusion;
pub mod orchestrator;
pub mod registry;
pub mod types;

// Re-export main types for convenience
pub use client::traits::{ClientError, Completion, CompletionMetadata, CompletionOptions, ModelClient, Usage};
pub use client::{MockClient, OpenAiClient};
pub use entropy::normalized_entropy;
pub use fusion::{fuse, normalize};
pub use orchestrator::{OracleError, Orchestrator};
pub use registry::ClientRegistry;
pub use types::*;
