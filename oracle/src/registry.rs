//! Registry of model clients keyed by model key.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::openai::DEFAULT_MODEL;
use crate::client::{ModelClient, OpenAiClient};

/// Registry key under which the environment-configured OpenAI client lives.
pub const OPENAI_KEY: &str = "openai";

/// A client plus the model id it is asked for.
#[derive(Clone)]
pub struct RegisteredClient {
    /// The transport
    pub client: Arc<dyn ModelClient>,
    /// Model id passed to `complete`
    pub model_id: String,
}

/// Model key → client mapping.
///
/// Built once before a run and then shared read-only.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    entries: HashMap<String, RegisteredClient>,
}

impl ClientRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry from the environment: `openai` when `OPENAI_API_KEY` is set.
    ///
    /// The model id comes from `OPENAI_MODEL`, falling back to the default model.
    pub fn from_env() -> Self {
        let mut registry = Self::new();
        if std::env::var("OPENAI_API_KEY").map(|k| k.is_empty()).unwrap_or(true) {
            return registry;
        }

        match OpenAiClient::from_env() {
            Ok(client) => {
                let model_id =
                    std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
                info!(model = %model_id, "Registered OpenAI client from environment");
                registry.register_model(OPENAI_KEY, Arc::new(client), model_id);
            }
            Err(e) => {
                warn!(error = %e, "Could not build OpenAI client from environment");
            }
        }
        registry
    }

    /// Register a client under a key; the key doubles as the model id.
    pub fn register(&mut self, key: impl Into<String>, client: Arc<dyn ModelClient>) {
        let key = key.into();
        self.register_model(key.clone(), client, key);
    }

    /// Register a client under a key with an explicit model id.
    pub fn register_model(
        &mut self,
        key: impl Into<String>,
        client: Arc<dyn ModelClient>,
        model_id: impl Into<String>,
    ) {
        self.entries.insert(
            key.into(),
            RegisteredClient {
                client,
                model_id: model_id.into(),
            },
        );
    }

    /// Builder-style registration.
    pub fn with(mut self, key: impl Into<String>, client: Arc<dyn ModelClient>) -> Self {
        self.register(key, client);
        self
    }

    /// Look up a client by key.
    pub fn get(&self, key: &str) -> Option<&RegisteredClient> {
        self.entries.get(key)
    }

    /// Check if a key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Registered entries, sorted by key.
    pub fn entries(&self) -> Vec<(&str, &RegisteredClient)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Get count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
