//! Validation failures collected across a whole request.
use std::collections::BTreeMap;

use serde::{Serialize, Serializer, ser::SerializeMap};
use thiserror::Error;

/// Which family of rule a violation comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// Type, presence or bound constraint from the rule catalog.
    Schema,
    /// Presence rule that only applies to one allocation strategy.
    Conditional,
    /// Identifier does not resolve to a usable record.
    Referential,
}

/// A single failed rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

/// Every violated rule of a request, keyed by dotted field path
/// (`limits.io`, `deploy.locations.0`).
///
/// Serializes as `{"field": ["message", ...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("request failed validation on {} field(s)", .fields.len())]
pub struct ValidationError {
    fields: BTreeMap<String, Vec<Violation>>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field`.
    pub fn push(
        &mut self,
        field: impl Into<String>,
        kind: ViolationKind,
        message: impl Into<String>,
    ) {
        self.fields.entry(field.into()).or_default().push(Violation {
            kind,
            message: message.into(),
        });
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one violation.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Violations recorded for `field`, in evaluation order.
    pub fn get(&self, field: &str) -> &[Violation] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Messages recorded for `field`.
    pub fn messages(&self, field: &str) -> Vec<&str> {
        self.get(field).iter().map(|v| v.message.as_str()).collect()
    }

    /// Field paths with violations, in lexical order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Violation])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl Serialize for ValidationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, violations) in &self.fields {
            let messages: Vec<&str> = violations.iter().map(|v| v.message.as_str()).collect();
            map.serialize_entry(field, &messages)?;
        }
        map.end()
    }
}
