//! Constraint evaluation over raw JSON values.
//!
//! A [`Scope`] lives for one validation call. Every failed rule is recorded in it and
//! surfaces to the caller as [`Rejected`], so callers can keep evaluating the remaining
//! fields and report all violations together.
use pylon_model::{AllocationId, Constraint, NodeId, Reference, ValueKind};
use serde_json::{Map, Value};

use crate::{
    refs::ReferentialChecker,
    violation::{ValidationError, ViolationKind},
};

/// The rule failed and its violation is already recorded in the scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rejected;

pub(crate) type Outcome<T> = Result<T, Rejected>;

/// Value that passed its type check, already coerced.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Checked<'v> {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Array(&'v [Value]),
    Object(&'v Map<String, Value>),
}

impl<'v> Checked<'v> {
    pub(crate) fn into_text(self) -> Option<String> {
        match self {
            Checked::Text(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn into_integer(self) -> Option<i64> {
        match self {
            Checked::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_boolean(self) -> Option<bool> {
        match self {
            Checked::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub(crate) fn into_array(self) -> Option<&'v [Value]> {
        match self {
            Checked::Array(items) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn into_object(self) -> Option<&'v Map<String, Value>> {
        match self {
            Checked::Object(map) => Some(map),
            _ => None,
        }
    }
}

enum Raw<'v> {
    Missing,
    Null,
    Given(&'v Value),
}

/// Blank strings count as `null`.
fn classify(value: Option<&Value>) -> Raw<'_> {
    match value {
        None => Raw::Missing,
        Some(Value::Null) => Raw::Null,
        Some(Value::String(s)) if s.trim().is_empty() => Raw::Null,
        Some(v) => Raw::Given(v),
    }
}

fn coerce(value: &Value, kind: ValueKind) -> Option<Checked<'_>> {
    match kind {
        ValueKind::String => value.as_str().map(|s| Checked::Text(s.trim().to_string())),
        ValueKind::Integer => integer(value).map(Checked::Integer),
        ValueKind::Boolean => boolean(value).map(Checked::Boolean),
        ValueKind::Array => value.as_array().map(|a| Checked::Array(a.as_slice())),
        ValueKind::Object => value.as_object().map(Checked::Object),
    }
}

/// Integers, integral floats and integer strings.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64),
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `true`/`false`, `0`/`1` and `"0"`/`"1"`.
fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn bound_violation(path: &str, checked: &Checked<'_>, rule: &Constraint) -> Option<String> {
    let (size, unit) = match checked {
        Checked::Integer(v) => (*v, ""),
        Checked::Text(s) => (
            i64::try_from(s.chars().count()).unwrap_or(i64::MAX),
            " characters",
        ),
        Checked::Boolean(_) | Checked::Array(_) | Checked::Object(_) => return None,
    };

    match (rule.min, rule.max) {
        (Some(min), Some(max)) if size < min || size > max => Some(format!(
            "The {path} must be between {min} and {max}{unit}."
        )),
        (Some(min), None) if size < min => {
            Some(format!("The {path} must be at least {min}{unit}."))
        }
        (None, Some(max)) if size > max => Some(format!(
            "The {path} may not be greater than {max}{unit}."
        )),
        _ => None,
    }
}

/// Evaluation state of one validation call.
pub(crate) struct Scope<'r, R: ?Sized> {
    node_id: NodeId,
    refs: &'r R,
    errors: ValidationError,
}

impl<'r, R> Scope<'r, R>
where
    R: ReferentialChecker + ?Sized,
{
    pub(crate) fn new(node_id: NodeId, refs: &'r R) -> Self {
        Self {
            node_id,
            refs,
            errors: ValidationError::new(),
        }
    }

    pub(crate) fn finish(self) -> ValidationError {
        self.errors
    }

    pub(crate) fn reject(&mut self, path: &str, kind: ViolationKind, message: String) -> Rejected {
        self.errors.push(path, kind, message);
        Rejected
    }

    fn type_mismatch(&mut self, path: &str, kind: ValueKind) -> Rejected {
        let message = format!("The {path} {}.", kind.expectation());
        self.reject(path, ViolationKind::Schema, message)
    }

    /// Evaluate `rule` against `value`.
    ///
    /// `Ok(None)` means the value is absent and the rule allows it.
    /// A type failure always stops evaluation; without `bail` a bound failure still
    /// runs the reference lookup so both are reported.
    pub(crate) fn check<'v>(
        &mut self,
        path: &str,
        value: Option<&'v Value>,
        rule: &Constraint,
    ) -> Outcome<Option<Checked<'v>>> {
        let value = match classify(value) {
            Raw::Missing | Raw::Null if rule.is_required() => {
                let message = format!("The {path} field is required.");
                return Err(self.reject(path, ViolationKind::Schema, message));
            }
            Raw::Missing => return Ok(None),
            Raw::Null if rule.nullable => return Ok(None),
            Raw::Null => return Err(self.type_mismatch(path, rule.kind)),
            Raw::Given(v) => v,
        };

        let Some(checked) = coerce(value, rule.kind) else {
            return Err(self.type_mismatch(path, rule.kind));
        };

        let mut failed = false;
        if let Some(message) = bound_violation(path, &checked, rule) {
            let rejected = self.reject(path, ViolationKind::Schema, message);
            if rule.bail {
                return Err(rejected);
            }
            failed = true;
        }

        if let (Some(reference), Checked::Integer(id)) = (rule.reference, &checked) {
            if !self.resolves(reference, *id) {
                let message = format!("The selected {path} is invalid.");
                self.reject(path, ViolationKind::Referential, message);
                failed = true;
            }
        }

        if failed { Err(Rejected) } else { Ok(Some(checked)) }
    }

    /// Negative keys never resolve and never reach the store.
    fn resolves(&self, reference: Reference, id: i64) -> bool {
        let Ok(id) = u64::try_from(id) else {
            return false;
        };
        match reference {
            Reference::Allocations => self.refs.allocation_exists(AllocationId(id), self.node_id),
            other => self.refs.record_exists(other, id),
        }
    }

    fn typed<'v, T>(
        &mut self,
        path: &str,
        value: Option<&'v Value>,
        rule: &Constraint,
        expected: ValueKind,
        pick: impl FnOnce(Checked<'v>) -> Option<T>,
    ) -> Outcome<Option<T>> {
        match self.check(path, value, rule)? {
            None => Ok(None),
            Some(checked) => pick(checked)
                .map(Some)
                .ok_or_else(|| self.type_mismatch(path, expected)),
        }
    }

    pub(crate) fn text(
        &mut self,
        path: &str,
        value: Option<&Value>,
        rule: &Constraint,
    ) -> Outcome<Option<String>> {
        self.typed(path, value, rule, ValueKind::String, Checked::into_text)
    }

    pub(crate) fn integer(
        &mut self,
        path: &str,
        value: Option<&Value>,
        rule: &Constraint,
    ) -> Outcome<Option<i64>> {
        self.typed(path, value, rule, ValueKind::Integer, Checked::into_integer)
    }

    pub(crate) fn boolean(
        &mut self,
        path: &str,
        value: Option<&Value>,
        rule: &Constraint,
    ) -> Outcome<Option<bool>> {
        self.typed(path, value, rule, ValueKind::Boolean, Checked::into_boolean)
    }

    pub(crate) fn array<'v>(
        &mut self,
        path: &str,
        value: Option<&'v Value>,
        rule: &Constraint,
    ) -> Outcome<Option<&'v [Value]>> {
        self.typed(path, value, rule, ValueKind::Array, Checked::into_array)
    }

    pub(crate) fn object<'v>(
        &mut self,
        path: &str,
        value: Option<&'v Value>,
        rule: &Constraint,
    ) -> Outcome<Option<&'v Map<String, Value>>> {
        self.typed(path, value, rule, ValueKind::Object, Checked::into_object)
    }

    /// Turn an optional outcome into a mandatory one.
    pub(crate) fn require<T>(&mut self, path: &str, outcome: Outcome<Option<T>>) -> Outcome<T> {
        match outcome? {
            Some(v) => Ok(v),
            None => {
                let message = format!("The {path} field is required.");
                Err(self.reject(path, ViolationKind::Schema, message))
            }
        }
    }

    /// Fail unless the key exists; `null` and empty values count as present.
    pub(crate) fn present(&mut self, path: &str, present: bool) -> Outcome<()> {
        if present {
            return Ok(());
        }
        let message = format!("The {path} field must be present.");
        Err(self.reject(path, ViolationKind::Conditional, message))
    }

    /// Apply `rule` to every entry, reporting each failure at `path.N`.
    pub(crate) fn each<'v, T>(
        &mut self,
        path: &str,
        items: &'v [Value],
        rule: &Constraint,
        pick: impl Fn(Checked<'v>) -> Option<T>,
    ) -> Outcome<Vec<T>> {
        let mut out = Vec::with_capacity(items.len());
        let mut failed = false;

        for (i, item) in items.iter().enumerate() {
            let entry = format!("{path}.{i}");
            match self.typed(&entry, Some(item), rule, rule.kind, &pick) {
                Ok(Some(v)) => out.push(v),
                Ok(None) => {}
                Err(Rejected) => failed = true,
            }
        }

        if failed { Err(Rejected) } else { Ok(out) }
    }

    /// Convert a validated integer into a record key.
    pub(crate) fn key<T: From<u64>>(&mut self, path: &str, raw: i64) -> Outcome<T> {
        match u64::try_from(raw) {
            Ok(id) => Ok(T::from(id)),
            Err(_) => {
                let message = format!("The {path} must be at least 0.");
                Err(self.reject(path, ViolationKind::Schema, message))
            }
        }
    }
}
