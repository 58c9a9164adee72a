//! Rule Set Model for the Logos governance engine
//!
//! This crate holds the governed data the decision pipeline works on:
//!
//! - **Rules**: governed policy units with a status ladder
//!   (draft → statutory → constitutional)
//! - **Amendments**: proposed changes to one or more rules, validated once at the boundary
//! - **Procedures**: the juridical routes an amendment may travel
//! - **Thresholds**: the acceptance gate's three limits
//!
//! # Key Components
//!
//! - [`RuleStore`]: Owned, ordered collection of rules; rules are mutated in place, never removed
//! - [`AmendmentDraft`]: Loosely-shaped caller input; [`Amendment`] is the validated form
//! - [`Constitution`], [`Policies`], [`AmendmentSet`]: YAML documents
//! - [`compute_hash`]: SHA-256 hex digests shared by fusion and the ledger
//! - [`canonical_json`]: sorted-key JSON text hashed by the ledger and the simulated ensemble
//!
//! # Example
//!
//! ```ignore
//! use logos_charter::{Amendment, Constitution, Policies};
//!
//! let constitution = Constitution::from_yaml(&std::fs::read_to_string("constitution.yaml")?)?;
//! let mut rules = Policies::from_yaml(&std::fs::read_to_string("policies.yaml")?)?.into_store()?;
//! let amendment = Amendment::try_from(draft)?;
//! ```

pub mod digest;
pub mod documents;
pub mod types;
pub mod validation;

// Re-export main types
pub use digest::{canonical_json, compute_hash, short_digest};
pub use documents::{AmendmentSet, Constitution, DocumentError, Policies};
pub use types::*;
pub use validation::{AmendmentDraft, StructuralError};
