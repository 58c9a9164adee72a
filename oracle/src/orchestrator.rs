//! Batch orchestration: fan prompts out to registered clients, collect, fuse.
//!
//! Every model key is resolved before any call is issued, so a missing
//! client aborts the batch up front. Once the batch is running, a failed or
//! timed-out member degrades to a synthetic `"error"` completion and the
//! rest of the batch proceeds.

use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::fusion::fuse;
use crate::registry::{ClientRegistry, RegisteredClient};
use crate::types::{Interpretation, ModelPrompt, RawCompletion};

/// Deadline applied to calls whose options carry none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors fatal to a whole batch.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// No client registered under the requested key
    #[error("No client registered for model '{model}' (available: {available:?})")]
    NoClient {
        model: String,
        available: Vec<String>,
    },
}

/// Runs prompt batches against a client registry.
#[derive(Clone)]
pub struct Orchestrator {
    registry: ClientRegistry,
    default_timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator over a registry.
    pub fn new(registry: ClientRegistry) -> Self {
        Self {
            registry,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the default per-call deadline.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// The underlying registry.
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Issue every prompt in parallel and collect one completion per prompt.
    ///
    /// Output order matches input order.
    pub async fn collect(&self, batch: &[ModelPrompt]) -> Result<Vec<RawCompletion>, OracleError> {
        let resolved = batch
            .iter()
            .map(|mp| self.resolve(&mp.model).map(|entry| (mp, entry)))
            .collect::<Result<Vec<_>, _>>()?;

        let batch_id = Uuid::new_v4();
        info!(batch_id = %batch_id, size = batch.len(), "Dispatching model batch");

        let calls = resolved
            .into_iter()
            .map(|(mp, entry)| self.call_one(batch_id, mp, entry));
        let raws = join_all(calls).await;

        let failures = raws.iter().filter(|r| r.is_error()).count();
        if failures > 0 {
            warn!(batch_id = %batch_id, failures, "Batch completed with failed members");
        } else {
            debug!(batch_id = %batch_id, "Batch completed");
        }

        Ok(raws)
    }

    /// Collect a batch and fuse it into one interpretation.
    pub async fn run(&self, batch: &[ModelPrompt]) -> Result<Interpretation, OracleError> {
        let raws = self.collect(batch).await?;
        Ok(fuse(&raws))
    }

    /// Send several prompts to one model key and fuse the answers.
    pub async fn run_prompts(
        &self,
        model: &str,
        prompts: &[String],
    ) -> Result<Interpretation, OracleError> {
        let batch: Vec<ModelPrompt> = prompts
            .iter()
            .map(|p| ModelPrompt::new(model, p.as_str()))
            .collect();
        self.run(&batch).await
    }

    fn resolve(&self, model: &str) -> Result<&RegisteredClient, OracleError> {
        self.registry.get(model).ok_or_else(|| OracleError::NoClient {
            model: model.to_string(),
            available: self.registry.keys(),
        })
    }

    async fn call_one(
        &self,
        batch_id: Uuid,
        mp: &ModelPrompt,
        entry: &RegisteredClient,
    ) -> RawCompletion {
        let deadline = mp.options.timeout().unwrap_or(self.default_timeout);
        let call = entry.client.complete(&entry.model_id, &mp.prompt, &mp.options);

        match tokio::time::timeout(deadline, call).await {
            Ok(Ok(completion)) => RawCompletion {
                model: mp.model.clone(),
                prompt: mp.prompt.clone(),
                output: completion.text,
                metadata: completion.metadata,
            },
            Ok(Err(e)) => {
                warn!(batch_id = %batch_id, model = %mp.model, error = %e, "Model call failed");
                RawCompletion::error(&mp.model, &mp.prompt, e.to_string())
            }
            Err(_) => {
                let ms = deadline.as_millis() as u64;
                warn!(batch_id = %batch_id, model = %mp.model, timeout_ms = ms, "Model call timed out");
                RawCompletion::error(&mp.model, &mp.prompt, format!("timed out after {}ms", ms))
            }
        }
    }
}
