//! Caller-side filter objects and their validation into a `FilterExpression`.
//!
//! # Design
//! `Filter` is plain, unvalidated data: an insertion-ordered list of
//! `(field, Directive)` pairs, built either with the fluent helpers or from a
//! JSON object. `FilterExpression::build` checks it against a resource's
//! `ConstraintSet` and normalizes range bounds (timestamps become epoch
//! seconds), so two logically equal filters produce the same expression.
//! Field order is carried through unchanged; it decides wire order.
//!
//! A JSON entry whose shape is not a directive is kept as a malformed entry
//! rather than failing the parse, so the builder can report unknown and
//! excluded fields ahead of shape problems.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::constraints::{ConstraintSet, FieldGroup, RangeKind, ResourceKind};
use crate::error::{FilterErrorReason, FilterValidationError};

/// A single filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    /// Integers above `i64::MAX`, kept exact.
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    /// Text used for the value on the wire.
    pub fn to_wire(&self) -> String {
        match self {
            Scalar::Str(s) => s.clone(),
            Scalar::Int(n) => n.to_string(),
            Scalar::UInt(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(n) => Some(*n as f64),
            Scalar::UInt(n) => Some(*n as f64),
            Scalar::Float(n) => Some(*n),
            _ => None,
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            Scalar::Float(n) => n.is_finite(),
            _ => true,
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Scalar::Str(s.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Scalar::Int)
                .or_else(|| n.as_u64().map(Scalar::UInt))
                .or_else(|| n.as_f64().map(Scalar::Float)),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Scalar::Int(n),
            Err(_) => Scalar::UInt(n),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Float(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// What the caller asked for on one field, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Value(Scalar),
    AnyOf(Vec<Scalar>),
    Range {
        from: Option<Scalar>,
        to: Option<Scalar>,
    },
}

/// Unvalidated, insertion-ordered filter object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// `None` marks a JSON entry that is not a directive at all.
    entries: Vec<(String, Option<Directive>)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directive for `field`. A field that is already present keeps
    /// its position and has its directive replaced.
    pub fn set(self, field: &str, directive: Directive) -> Self {
        self.put(field, Some(directive))
    }

    fn put(mut self, field: &str, directive: Option<Directive>) -> Self {
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = directive,
            None => self.entries.push((field.to_string(), directive)),
        }
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Scalar>) -> Self {
        self.set(field, Directive::Value(value.into()))
    }

    pub fn any_of<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.set(field, Directive::AnyOf(values))
    }

    pub fn between(self, field: &str, from: impl Into<Scalar>, to: impl Into<Scalar>) -> Self {
        self.set(
            field,
            Directive::Range {
                from: Some(from.into()),
                to: Some(to.into()),
            },
        )
    }

    /// Set the lower bound, keeping an upper bound set earlier.
    pub fn from(self, field: &str, value: impl Into<Scalar>) -> Self {
        let to = self.upper_bound(field);
        self.set(
            field,
            Directive::Range {
                from: Some(value.into()),
                to,
            },
        )
    }

    /// Set the upper bound, keeping a lower bound set earlier.
    pub fn to(self, field: &str, value: impl Into<Scalar>) -> Self {
        let from = self.lower_bound(field);
        self.set(
            field,
            Directive::Range {
                from,
                to: Some(value.into()),
            },
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Fields with a well-formed directive, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Directive)> {
        self.entries
            .iter()
            .filter_map(|(name, d)| d.as_ref().map(|d| (name.as_str(), d)))
    }

    /// Read a filter from a JSON object, keeping its key order.
    ///
    /// Scalars become `Value`, arrays become `AnyOf` and objects become
    /// `Range` (only `from`/`to` keys are allowed). Any other shape, such as
    /// `null` or a nested list, is kept as malformed and rejected with
    /// `WrongDirectiveKind` by `FilterExpression::build` once the field itself
    /// is known to be filterable. Emptiness is not checked here either.
    pub fn from_json(value: &Value) -> Result<Self, FilterValidationError> {
        let object = value.as_object().ok_or_else(|| {
            FilterValidationError::new("filter", FilterErrorReason::WrongDirectiveKind)
        })?;

        let filter = object
            .iter()
            .fold(Filter::new(), |filter, (field, raw)| filter.put(field, directive_from_json(raw)));
        Ok(filter)
    }

    fn lower_bound(&self, field: &str) -> Option<Scalar> {
        match self.get(field) {
            Some(Directive::Range { from, .. }) => from.clone(),
            _ => None,
        }
    }

    fn upper_bound(&self, field: &str) -> Option<Scalar> {
        match self.get(field) {
            Some(Directive::Range { to, .. }) => to.clone(),
            _ => None,
        }
    }

    fn get(&self, field: &str) -> Option<&Directive> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, d)| d.as_ref())
    }
}

fn directive_from_json(raw: &Value) -> Option<Directive> {
    match raw {
        Value::Array(items) => items
            .iter()
            .map(Scalar::from_json)
            .collect::<Option<Vec<_>>>()
            .map(Directive::AnyOf),
        Value::Object(bounds) => {
            let mut from = None;
            let mut to = None;
            for (key, bound) in bounds {
                let bound = Scalar::from_json(bound)?;
                match key.as_str() {
                    "from" => from = Some(bound),
                    "to" => to = Some(bound),
                    _ => return None,
                }
            }
            Some(Directive::Range { from, to })
        }
        scalar => Scalar::from_json(scalar).map(Directive::Value),
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Filter::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// A validated condition on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Scalar),
    AnyOf(Vec<Scalar>),
    /// At least one bound is present. Timestamp bounds are epoch seconds.
    Range {
        from: Option<Scalar>,
        to: Option<Scalar>,
    },
}

/// A filter that passed validation for one resource kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    resource: ResourceKind,
    conditions: Vec<(String, Condition)>,
}

impl FilterExpression {
    pub fn build(
        constraints: &ConstraintSet,
        filter: &Filter,
    ) -> Result<Self, FilterValidationError> {
        let conditions = filter
            .entries
            .iter()
            .map(|(field, directive)| {
                validate_field(constraints, field, directive.as_ref())
                    .map(|c| (field.to_string(), c))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            resource: constraints.resource,
            conditions,
        })
    }

    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

fn validate_field(
    constraints: &ConstraintSet,
    field: &str,
    directive: Option<&Directive>,
) -> Result<Condition, FilterValidationError> {
    let fail = |reason| FilterValidationError::new(field, reason);

    match (constraints.group_of(field), directive) {
        (FieldGroup::Unknown, _) => Err(fail(FilterErrorReason::UnknownField)),
        (FieldGroup::Excluded, _) => Err(fail(FilterErrorReason::ExcludedField)),
        (_, None) => Err(fail(FilterErrorReason::WrongDirectiveKind)),

        (FieldGroup::Exact, Some(Directive::Value(value))) if !value.is_finite() => {
            Err(fail(FilterErrorReason::InvalidValue))
        }
        (FieldGroup::Exact, Some(Directive::Value(value))) => Ok(Condition::Equals(value.clone())),
        (FieldGroup::Exact, Some(Directive::AnyOf(values))) if values.is_empty() => {
            Err(fail(FilterErrorReason::EmptyList))
        }
        (FieldGroup::Exact, Some(Directive::AnyOf(values)))
            if !values.iter().all(Scalar::is_finite) =>
        {
            Err(fail(FilterErrorReason::InvalidValue))
        }
        (FieldGroup::Exact, Some(Directive::AnyOf(values))) => Ok(Condition::AnyOf(values.clone())),
        (FieldGroup::Exact, Some(Directive::Range { .. })) => {
            Err(fail(FilterErrorReason::WrongDirectiveKind))
        }

        (FieldGroup::Range(_), Some(Directive::Value(_) | Directive::AnyOf(_))) => {
            Err(fail(FilterErrorReason::WrongDirectiveKind))
        }
        (FieldGroup::Range(_), Some(Directive::Range { from: None, to: None })) => {
            Err(fail(FilterErrorReason::EmptyRange))
        }
        (FieldGroup::Range(kind), Some(Directive::Range { from, to })) => {
            let normalize = |bound: &Option<Scalar>| {
                bound
                    .as_ref()
                    .map(|b| normalize_bound(kind, b).ok_or_else(|| fail(FilterErrorReason::InvalidBound)))
                    .transpose()
            };
            let from = normalize(from)?;
            let to = normalize(to)?;

            if let (Some(lo), Some(hi)) = (&from, &to) {
                if let (Some(lo), Some(hi)) = (lo.as_f64(), hi.as_f64()) {
                    if lo > hi {
                        return Err(fail(FilterErrorReason::InvertedRange));
                    }
                }
            }
            Ok(Condition::Range { from, to })
        }
    }
}

fn normalize_bound(kind: RangeKind, bound: &Scalar) -> Option<Scalar> {
    match (kind, bound) {
        (RangeKind::Timestamp, Scalar::Int(secs)) if *secs >= 0 => Some(Scalar::Int(*secs)),
        (RangeKind::Timestamp, Scalar::Str(text)) => parse_timestamp(text).map(Scalar::Int),
        (RangeKind::Number, Scalar::Int(n)) => Some(Scalar::Int(*n)),
        (RangeKind::Number, Scalar::UInt(n)) => Some(Scalar::UInt(*n)),
        (RangeKind::Number, Scalar::Float(n)) if n.is_finite() => Some(Scalar::Float(*n)),
        _ => None,
    }
}

/// Epoch seconds from either a decimal string or an RFC 3339 timestamp.
fn parse_timestamp(text: &str) -> Option<i64> {
    if let Ok(secs) = text.parse::<i64>() {
        return (secs >= 0).then_some(secs);
    }
    chrono::DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.timestamp())
        .filter(|secs| *secs >= 0)
}
