//! Structural validation of amendments at the system boundary.
//!
//! Callers hand in an [`AmendmentDraft`] (every field optional, exactly as it
//! came off the wire or out of a YAML file). Converting it into an
//! [`Amendment`] is the only place field presence and field types are checked;
//! downstream consumers work with the validated type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{Amendment, ContentDelta, StatusAction};

/// Error types for structural validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    /// A required field is absent
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A content delta value has the wrong type for its rule field
    #[error("Field {field} must be {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },

    /// A content delta tries to overwrite a field that cannot change
    #[error("Field cannot be amended: {0}")]
    ImmutableField(String),

    /// The input is not an amendment-shaped object at all
    #[error("Malformed amendment: {0}")]
    Malformed(String),
}

/// Amendment as supplied by a caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmendmentDraft {
    pub id: Option<String>,
    pub parent_ids: Option<Vec<String>>,
    pub status_action: Option<StatusAction>,
    pub content_delta: Option<BTreeMap<String, Value>>,
    pub procedure_id: Option<String>,
    pub evidence: Option<Vec<String>>,
}

impl AmendmentDraft {
    /// Create a draft with every required field filled and no content.
    pub fn new(id: impl Into<String>, procedure_id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            parent_ids: Some(Vec::new()),
            status_action: Some(StatusAction::None),
            content_delta: Some(BTreeMap::new()),
            procedure_id: Some(procedure_id.into()),
            evidence: Some(Vec::new()),
        }
    }

    /// Parse a draft from an arbitrary JSON value.
    pub fn from_value(value: Value) -> Result<Self, StructuralError> {
        serde_json::from_value(value).map_err(|e| StructuralError::Malformed(e.to_string()))
    }

    /// Add a parent rule id.
    pub fn with_parent(mut self, rule_id: impl Into<String>) -> Self {
        self.parent_ids.get_or_insert_with(Vec::new).push(rule_id.into());
        self
    }

    /// Add a content delta entry.
    pub fn with_delta(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.content_delta
            .get_or_insert_with(BTreeMap::new)
            .insert(field.into(), value.into());
        self
    }

    /// Add an evidence reference.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence.get_or_insert_with(Vec::new).push(evidence.into());
        self
    }

    /// Set the status action.
    pub fn with_status_action(mut self, action: StatusAction) -> Self {
        self.status_action = Some(action);
        self
    }

    /// Validate into an [`Amendment`].
    pub fn validate(&self) -> Result<Amendment, StructuralError> {
        Amendment::try_from(self.clone())
    }
}

impl TryFrom<AmendmentDraft> for Amendment {
    type Error = StructuralError;

    fn try_from(draft: AmendmentDraft) -> Result<Self, Self::Error> {
        let id = draft.id.ok_or(StructuralError::MissingField("id"))?;
        let parent_ids = draft
            .parent_ids
            .ok_or(StructuralError::MissingField("parent_ids"))?;
        let status_action = draft
            .status_action
            .ok_or(StructuralError::MissingField("status_action"))?;
        let content_delta = draft
            .content_delta
            .ok_or(StructuralError::MissingField("content_delta"))?;
        let procedure_id = draft
            .procedure_id
            .ok_or(StructuralError::MissingField("procedure_id"))?;
        let evidence = draft
            .evidence
            .ok_or(StructuralError::MissingField("evidence"))?;

        Ok(Amendment {
            id,
            parent_ids,
            status_action,
            content_delta: ContentDelta::try_from(content_delta)?,
            procedure_id,
            evidence,
        })
    }
}

impl From<&Amendment> for AmendmentDraft {
    fn from(amendment: &Amendment) -> Self {
        let content_delta = amendment
            .content_delta
            .iter()
            .map(|(field, update)| (field.to_string(), update.to_value()))
            .collect();

        Self {
            id: Some(amendment.id.clone()),
            parent_ids: Some(amendment.parent_ids.clone()),
            status_action: Some(amendment.status_action),
            content_delta: Some(content_delta),
            procedure_id: Some(amendment.procedure_id.clone()),
            evidence: Some(amendment.evidence.clone()),
        }
    }
}
