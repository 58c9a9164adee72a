//! Common types for the logos-oracle crate.

use serde::{Deserialize, Serialize, Serializer};

use crate::client::traits::{CompletionMetadata, CompletionOptions};

/// Output text recorded for a member whose call failed or timed out.
pub const ERROR_OUTPUT: &str = "error";

/// One prompt addressed to one registered model key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrompt {
    /// Registry key of the client to call
    pub model: String,
    /// Prompt text
    pub prompt: String,
    /// Sampling and timeout options
    #[serde(default)]
    pub options: CompletionOptions,
}

impl ModelPrompt {
    /// Create a prompt with default options.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: CompletionOptions::default(),
        }
    }

    /// Set the options.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

/// A single model output, consumed once by fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCompletion {
    /// Registry key of the client that produced it
    pub model: String,
    /// Prompt that was sent
    pub prompt: String,
    /// Output text
    pub output: String,
    /// Provider metadata
    pub metadata: CompletionMetadata,
}

impl RawCompletion {
    /// Create a completion with empty metadata.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, output: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            metadata: CompletionMetadata::for_model(&model),
            model,
            prompt: prompt.into(),
            output: output.into(),
        }
    }

    /// Synthetic completion standing in for a failed or timed-out call.
    pub fn error(model: impl Into<String>, prompt: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut raw = Self::new(model, prompt, ERROR_OUTPUT);
        raw.metadata.error = Some(reason.into());
        raw
    }

    /// Whether this completion is a synthetic error.
    pub fn is_error(&self) -> bool {
        self.metadata.error.is_some()
    }
}

/// Intent labels recognised by fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Summarize,
    Classify,
    Extract,
    Plan,
    Unknown,
}

impl Intent {
    /// Label used for voting and tie-breaking
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Classify => "classify",
            Self::Extract => "extract",
            Self::Plan => "plan",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments merged across every member of a fused batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedArguments {
    /// Fewest whitespace tokens in any member
    pub tokens_min: usize,
    /// Most whitespace tokens in any member
    pub tokens_max: usize,
    /// Sorted 12-hex-char content digests, one per member
    pub hashes: Vec<String>,
}

/// Normalized, deterministic result of fusing a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    /// Winning intent
    pub intent: Intent,
    /// Merged arguments; serialized as `{}` for an empty batch
    #[serde(serialize_with = "arguments_or_empty")]
    pub arguments: Option<MergedArguments>,
    /// Confidence in [0, 1], rounded to three decimals
    pub confidence: f64,
}

impl Interpretation {
    /// Interpretation of an empty batch.
    pub fn empty() -> Self {
        Self {
            intent: Intent::Unknown,
            arguments: None,
            confidence: 0.0,
        }
    }
}

fn arguments_or_empty<S: Serializer>(
    arguments: &Option<MergedArguments>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match arguments {
        Some(args) => args.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}
