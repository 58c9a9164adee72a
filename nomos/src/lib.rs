//! Logos Nomos - amendments in, accept/reject out, every acceptance on record
//!
//! Provides:
//! - **Entropy estimation**: pluggable strategies scoring disagreement about an amendment
//! - **Acceptance gate**: coherence, traceability and blast radius against thresholds
//! - **Amendment processor**: structural → juridical → scoring → gate → commit
//! - **Ledger**: append-only, hash-chained JSONL journal
//! - **Governor**: single writer owning the rule store and the ledger
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        Governor                            │
//! │           (one lock: validate → append → mutate)           │
//! │                                                            │
//! │  ┌────────────┐   ┌───────────┐   ┌──────┐   ┌──────────┐  │
//! │  │ Validation │──▶│ Estimator │──▶│ Gate │──▶│  Ledger  │  │
//! │  └────────────┘   └───────────┘   └──────┘   └────┬─────┘  │
//! │                                                   │        │
//! │                                           ┌───────▼──────┐ │
//! │                                           │   Mutation   │ │
//! │                                           └──────────────┘ │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod estimator;
pub mod gate;
pub mod governor;
pub mod ledger;
pub mod processor;
pub mod types;

// Re-export main types
pub use config::EngineConfig;
pub use estimator::{
    EntropyEstimator, HeuristicEstimator, ModelEnsembleEstimator, SimulatedEnsembleEstimator,
};
pub use gate::{accept, blast_radius, traceability};
pub use governor::Governor;
pub use ledger::{verify_chain, Ledger, LedgerError, LedgerRecord};
pub use processor::{AmendmentProcessor, JuridicalError};
pub use types::*;
