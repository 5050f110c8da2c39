//! Declarative field constraints.
//!
//! A [`Constraint`] describes what a single attribute must look like: presence, value kind,
//! numeric (or length) bounds and an optional foreign-key reference.
//! Resources declare their creation rules as a [`RuleSet`]; the [`RuleCatalog`] collects them so
//! request validators read constraints from the same place the resource schema is defined.
use std::{collections::BTreeMap, fmt};

use crate::server::{Resource, Server};

/// Whether an attribute must be supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    /// Missing, `null` and empty-string values are rejected.
    Required,
    /// The attribute is checked only when its key is present.
    Sometimes,
}

/// Expected shape of an attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ValueKind {
    /// Human-readable expectation used in violation messages.
    pub fn expectation(&self) -> &'static str {
        match self {
            ValueKind::String => "must be a string",
            ValueKind::Integer => "must be an integer",
            ValueKind::Boolean => "field must be true or false",
            ValueKind::Array => "must be an array",
            ValueKind::Object => "must be an object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(s)
    }
}

/// Record table an integer attribute must point into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reference {
    Users,
    Eggs,
    /// Allocation on the request's target node with no server assigned.
    Allocations,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reference::Users => "users",
            Reference::Eggs => "eggs",
            Reference::Allocations => "allocations",
        };
        f.write_str(s)
    }
}

/// Composable constraint for a single attribute.
///
/// For [`ValueKind::Integer`] the bounds apply to the value, for [`ValueKind::String`]
/// they apply to the character count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Constraint {
    pub presence: Presence,
    pub nullable: bool,
    pub kind: ValueKind,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub reference: Option<Reference>,
    /// Stop at the first failing clause instead of reporting every failure.
    pub bail: bool,
}

impl Constraint {
    /// Required attribute of the given kind.
    pub const fn required(kind: ValueKind) -> Self {
        Self::with_presence(Presence::Required, kind)
    }

    /// Attribute checked only when present.
    pub const fn sometimes(kind: ValueKind) -> Self {
        Self::with_presence(Presence::Sometimes, kind)
    }

    const fn with_presence(presence: Presence, kind: ValueKind) -> Self {
        Self {
            presence,
            nullable: false,
            kind,
            min: None,
            max: None,
            reference: None,
            bail: false,
        }
    }

    /// Accept `null` (and empty strings) as "not given".
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub const fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub const fn between(self, min: i64, max: i64) -> Self {
        self.min(min).max(max)
    }

    /// Require the value to reference an existing record.
    pub const fn exists(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub const fn bail(mut self) -> Self {
        self.bail = true;
        self
    }

    pub const fn is_required(&self) -> bool {
        matches!(self.presence, Presence::Required)
    }
}

/// Mapping of attribute name to its constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet(BTreeMap<&'static str, Constraint>);

impl RuleSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert; a repeated field replaces the earlier constraint.
    pub fn with(mut self, field: &'static str, constraint: Constraint) -> Self {
        self.0.insert(field, constraint);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Constraint> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Constraint)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

/// Resources that declare creation rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceKind {
    Server,
}

/// Registry of creation rules per resource kind.
#[derive(Clone, Debug)]
pub struct RuleCatalog {
    sets: BTreeMap<ResourceKind, RuleSet>,
}

impl RuleCatalog {
    /// Catalog with every built-in resource registered.
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        catalog.register::<Server>();
        catalog
    }

    /// Catalog with no resources.
    pub fn empty() -> Self {
        Self {
            sets: BTreeMap::new(),
        }
    }

    /// Register (or replace) the creation rules declared by `R`.
    pub fn register<R: Resource>(&mut self) -> &mut Self {
        self.sets.insert(R::KIND, R::create_rules());
        self
    }

    /// Creation rules for `kind`, if registered.
    pub fn rules_for(&self, kind: ResourceKind) -> Option<&RuleSet> {
        self.sets.get(&kind)
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}
