//! Core types for the governed rule set.
//!
//! Rules are owned by a [`RuleStore`] and only ever change through accepted
//! amendments. Amendments arrive as drafts and are validated into the types
//! below exactly once (see [`crate::validation`]).

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::documents::DocumentError;
use crate::validation::{AmendmentDraft, StructuralError};

/// Status ladder of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    /// Proposed, not yet binding
    Draft,
    /// Binding through the normal legislative route
    Statutory,
    /// Binding and entrenched
    Constitutional,
}

impl RuleStatus {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Statutory => "statutory",
            Self::Constitutional => "constitutional",
        }
    }
}

impl Default for RuleStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// A governed policy unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier
    pub id: String,
    /// Current status
    pub status: RuleStatus,
    /// What the rule is for
    pub intent: String,
    /// Where the rule applies
    pub scope: String,
    /// What the rule does
    pub effect: String,
    /// Precedence (higher wins)
    pub precedence: i64,
    /// Identifiers of the tests that guard this rule, in order
    #[serde(default)]
    pub tests: Vec<String>,
    /// Fields merged in by amendments that are not part of the typed model
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl Rule {
    /// Create a draft rule with empty scope and no tests.
    pub fn new(id: impl Into<String>, intent: impl Into<String>, effect: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: RuleStatus::Draft,
            intent: intent.into(),
            scope: String::new(),
            effect: effect.into(),
            precedence: 0,
            tests: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: RuleStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the precedence.
    pub fn with_precedence(mut self, precedence: i64) -> Self {
        self.precedence = precedence;
        self
    }

    /// Overwrite every field named in the delta.
    pub fn apply_delta(&mut self, delta: &ContentDelta) {
        for (field, update) in delta.iter() {
            match update {
                FieldUpdate::Intent(v) => self.intent = v.clone(),
                FieldUpdate::Scope(v) => self.scope = v.clone(),
                FieldUpdate::Effect(v) => self.effect = v.clone(),
                FieldUpdate::Precedence(v) => self.precedence = *v,
                FieldUpdate::Tests(v) => self.tests = v.clone(),
                FieldUpdate::Extension(v) => {
                    self.extensions.insert(field.to_string(), v.clone());
                }
            }
        }
    }

    /// Apply an accepted amendment: content first, then the status transition.
    pub fn apply_amendment(&mut self, amendment: &Amendment) {
        self.apply_delta(&amendment.content_delta);
        if let Some(status) = amendment.status_action.target_status() {
            self.status = status;
        }
    }
}

/// Status transition requested by an amendment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    /// Content change only
    None,
    /// Promote the parents to statutory
    TransmuteToStatutory,
    /// Promote the parents to constitutional
    TransmuteToConstitutional,
}

impl StatusAction {
    /// The status the parents end up in, if this action changes it.
    pub fn target_status(&self) -> Option<RuleStatus> {
        match self {
            Self::None => None,
            Self::TransmuteToStatutory => Some(RuleStatus::Statutory),
            Self::TransmuteToConstitutional => Some(RuleStatus::Constitutional),
        }
    }

    /// Whether this action needs a procedure that permits transmutation.
    pub fn is_transmutation(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TransmuteToStatutory => "transmute_to_statutory",
            Self::TransmuteToConstitutional => "transmute_to_constitutional",
        }
    }
}

/// One typed field overwrite carried by a content delta.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Intent(String),
    Scope(String),
    Effect(String),
    Precedence(i64),
    Tests(Vec<String>),
    /// Any field outside the typed rule model
    Extension(Value),
}

impl FieldUpdate {
    /// Type-check a raw `field: value` pair against the rule model.
    pub fn parse(field: &str, value: &Value) -> Result<Self, StructuralError> {
        let mismatch = |expected: &'static str| StructuralError::FieldType {
            field: field.to_string(),
            expected,
        };

        match field {
            // Status moves only through `status_action`, which the procedure check sees
            "id" | "status" => Err(StructuralError::ImmutableField(field.to_string())),
            "intent" | "scope" | "effect" => {
                let text = value.as_str().ok_or_else(|| mismatch("string"))?.to_string();
                Ok(match field {
                    "intent" => Self::Intent(text),
                    "scope" => Self::Scope(text),
                    _ => Self::Effect(text),
                })
            }
            "precedence" => value
                .as_i64()
                .map(Self::Precedence)
                .ok_or_else(|| mismatch("integer")),
            "tests" => {
                let items = value.as_array().ok_or_else(|| mismatch("list of strings"))?;
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .map(Self::Tests)
                    .ok_or_else(|| mismatch("list of strings"))
            }
            _ => Ok(Self::Extension(value.clone())),
        }
    }

    /// The value as it appeared in the amendment.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Intent(v) | Self::Scope(v) | Self::Effect(v) => Value::String(v.clone()),
            Self::Precedence(v) => Value::from(*v),
            Self::Tests(v) => Value::from(v.clone()),
            Self::Extension(v) => v.clone(),
        }
    }

    /// Text form used in facts: strings trimmed, everything else compact JSON.
    pub fn render(&self) -> String {
        match self.to_value() {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        }
    }
}

/// Validated `field → value` mapping of an amendment, kept in key order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Value>")]
pub struct ContentDelta {
    fields: BTreeMap<String, FieldUpdate>,
}

impl ContentDelta {
    /// Number of fields touched.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the delta touches nothing.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(field, update)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldUpdate)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get the update for a field.
    pub fn get(&self, field: &str) -> Option<&FieldUpdate> {
        self.fields.get(field)
    }
}

impl TryFrom<BTreeMap<String, Value>> for ContentDelta {
    type Error = StructuralError;

    fn try_from(raw: BTreeMap<String, Value>) -> Result<Self, Self::Error> {
        let mut fields = BTreeMap::new();
        for (field, value) in &raw {
            fields.insert(field.clone(), FieldUpdate::parse(field, value)?);
        }
        Ok(Self { fields })
    }
}

impl Serialize for ContentDelta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, update) in &self.fields {
            map.serialize_entry(field, &update.to_value())?;
        }
        map.end()
    }
}

/// A validated proposal to change one or more rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AmendmentDraft")]
pub struct Amendment {
    /// Unique identifier
    pub id: String,
    /// Rules this amendment changes
    pub parent_ids: Vec<String>,
    /// Status transition applied to the parents on acceptance
    pub status_action: StatusAction,
    /// Field overwrites applied to the parents on acceptance
    pub content_delta: ContentDelta,
    /// Procedure the amendment is filed under
    pub procedure_id: String,
    /// Supporting evidence references
    pub evidence: Vec<String>,
}

impl Amendment {
    /// Content delta rendered as `key:value` facts, `["noop"]` when empty.
    pub fn facts(&self) -> Vec<String> {
        if self.content_delta.is_empty() {
            return vec!["noop".to_string()];
        }
        self.content_delta
            .iter()
            .map(|(field, update)| format!("{}:{}", field, update.render()))
            .collect()
    }

    /// Whether the delta touches a field starting with any of the prefixes.
    pub fn touches_any(&self, prefixes: &[&str]) -> bool {
        self.content_delta
            .iter()
            .any(|(field, _)| prefixes.iter().any(|p| field.starts_with(p)))
    }
}

/// A juridical route for amendments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    /// Unique identifier
    pub id: String,
    /// Whether amendments filed under this procedure may change rule status
    #[serde(default)]
    pub transmutation_allowed: bool,
}

impl Procedure {
    /// Create a procedure.
    pub fn new(id: impl Into<String>, transmutation_allowed: bool) -> Self {
        Self {
            id: id.into(),
            transmutation_allowed,
        }
    }
}

/// Acceptance gate limits, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum coherence
    pub coherence: f64,
    /// Minimum traceability
    pub traceability: f64,
    /// Maximum blast radius
    pub blast_radius: f64,
}

impl Thresholds {
    /// Create range-checked thresholds.
    pub fn new(coherence: f64, traceability: f64, blast_radius: f64) -> Result<Self, DocumentError> {
        let thresholds = Self {
            coherence,
            traceability,
            blast_radius,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Check every limit lies in [0, 1].
    pub fn validate(&self) -> Result<(), DocumentError> {
        for (name, value) in [
            ("coherence", self.coherence),
            ("traceability", self.traceability),
            ("blast_radius", self.blast_radius),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DocumentError::ThresholdOutOfRange {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Ordered collection of rules with id lookup.
///
/// Rules are mutated in place by accepted amendments and never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleStore {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleStore {
    /// Build a store, rejecting duplicate ids.
    pub fn new(rules: Vec<Rule>) -> Result<Self, DocumentError> {
        let mut index = HashMap::with_capacity(rules.len());
        for (position, rule) in rules.iter().enumerate() {
            if index.insert(rule.id.clone(), position).is_some() {
                return Err(DocumentError::DuplicateRule(rule.id.clone()));
            }
        }
        Ok(Self { rules, index })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the store holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Get a rule by id.
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    /// All rules in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Iterate over rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Apply an accepted amendment to every parent rule that exists.
    ///
    /// Returns the ids of the rules that were changed. Unknown parent ids are skipped.
    pub fn apply_amendment(&mut self, amendment: &Amendment) -> Vec<String> {
        let mut touched = Vec::new();
        for parent_id in &amendment.parent_ids {
            match self.index.get(parent_id) {
                Some(&i) => {
                    self.rules[i].apply_amendment(amendment);
                    touched.push(parent_id.clone());
                }
                None => {
                    tracing::debug!(
                        amendment_id = %amendment.id,
                        parent_id = %parent_id,
                        "Parent rule not in store, skipping"
                    );
                }
            }
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delta(value: Value) -> ContentDelta {
        let raw: BTreeMap<String, Value> = serde_json::from_value(value).unwrap();
        ContentDelta::try_from(raw).unwrap()
    }

    fn amendment(content_delta: ContentDelta, status_action: StatusAction) -> Amendment {
        Amendment {
            id: "A-1".to_string(),
            parent_ids: vec!["R-1".to_string()],
            status_action,
            content_delta,
            procedure_id: "P-1".to_string(),
            evidence: vec![],
        }
    }

    #[test]
    fn test_status_action_targets() {
        assert_eq!(StatusAction::None.target_status(), None);
        assert_eq!(
            StatusAction::TransmuteToStatutory.target_status(),
            Some(RuleStatus::Statutory)
        );
        assert_eq!(
            StatusAction::TransmuteToConstitutional.target_status(),
            Some(RuleStatus::Constitutional)
        );
        assert!(!StatusAction::None.is_transmutation());
    }

    #[test]
    fn test_field_update_type_checks() {
        assert!(FieldUpdate::parse("precedence", &json!(3)).is_ok());
        assert!(matches!(
            FieldUpdate::parse("precedence", &json!("high")),
            Err(StructuralError::FieldType { .. })
        ));
        assert!(matches!(
            FieldUpdate::parse("tests", &json!(["t1", 2])),
            Err(StructuralError::FieldType { .. })
        ));
        assert!(matches!(
            FieldUpdate::parse("id", &json!("R-9")),
            Err(StructuralError::ImmutableField(_))
        ));
        assert_eq!(
            FieldUpdate::parse("status", &json!("constitutional")),
            Err(StructuralError::ImmutableField("status".to_string()))
        );
        assert_eq!(
            FieldUpdate::parse("owner", &json!({"team": "ops"})).unwrap(),
            FieldUpdate::Extension(json!({"team": "ops"}))
        );
    }

    #[test]
    fn test_facts_are_key_ordered_and_trimmed() {
        let a = amendment(
            delta(json!({"scope": "  eu ", "effect": "Deny", "precedence": 4})),
            StatusAction::None,
        );
        assert_eq!(a.facts(), vec!["effect:Deny", "precedence:4", "scope:eu"]);
        assert!(a.touches_any(&["effect", "intent"]));

        let empty = amendment(ContentDelta::default(), StatusAction::None);
        assert_eq!(empty.facts(), vec!["noop"]);
        assert!(!empty.touches_any(&["effect", "intent"]));
    }

    #[test]
    fn test_apply_amendment_overwrites_and_transmutes() {
        let mut store = RuleStore::new(vec![
            Rule::new("R-1", "protect", "allow").with_status(RuleStatus::Draft),
            Rule::new("R-2", "observe", "log"),
        ])
        .unwrap();

        let a = amendment(
            delta(json!({"effect": "deny", "tests": ["t-1"], "owner": "ops"})),
            StatusAction::TransmuteToConstitutional,
        );
        let touched = store.apply_amendment(&a);

        assert_eq!(touched, vec!["R-1"]);
        let r1 = store.get("R-1").unwrap();
        assert_eq!(r1.effect, "deny");
        assert_eq!(r1.tests, vec!["t-1"]);
        assert_eq!(r1.status, RuleStatus::Constitutional);
        assert_eq!(r1.extensions.get("owner"), Some(&json!("ops")));
        assert_eq!(store.get("R-2").unwrap().effect, "log");
    }

    #[test]
    fn test_rule_store_rejects_duplicates() {
        let result = RuleStore::new(vec![Rule::new("R-1", "a", "b"), Rule::new("R-1", "c", "d")]);
        assert!(matches!(result, Err(DocumentError::DuplicateRule(id)) if id == "R-1"));
    }

    #[test]
    fn test_thresholds_range() {
        assert!(Thresholds::new(0.5, 0.5, 0.9).is_ok());
        assert!(Thresholds::new(1.2, 0.5, 0.9).is_err());
        assert!(Thresholds::new(0.5, -0.1, 0.9).is_err());
    }

    #[test]
    fn test_content_delta_serializes_original_values() {
        let d = delta(json!({"effect": "X", "precedence": 2}));
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            json!({"effect": "X", "precedence": 2})
        );
    }
}
