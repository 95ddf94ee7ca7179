//! Query parameter shapes per endpoint and their canonical wire encoding.
//!
//! # Design
//! Each query-capable endpoint has its own parameter struct, so an endpoint
//! can only be handed the parameters it accepts (`CustomerParams` has no
//! filter, `TransactionListParams` has no free-text search). All of them
//! lower into `QueryParams`, which `encode` validates against a
//! `ConstraintSet` and flattens into an ordered `(key, value)` list.
//!
//! Output order is fixed: `page`, `limit`, `query`, the filter fields in the
//! order they were set, then `with`. Identical input always yields an
//! identical parameter list.

use serde::Deserialize;
use serde_json::Number;

use crate::constraints::ConstraintSet;
use crate::error::{FilterErrorReason, FilterValidationError};
use crate::filter::{Condition, Filter, FilterExpression};

/// Free-text search term; the API accepts text or a number.
///
/// Numbers are kept as JSON numbers, so 64-bit integers and finite
/// fractions go on the wire exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SearchTerm {
    Number(Number),
    Text(String),
}

impl SearchTerm {
    /// A fractional search term. `None` for NaN and infinities, which have
    /// no wire form.
    pub fn fraction(n: f64) -> Option<Self> {
        Number::from_f64(n).map(SearchTerm::Number)
    }

    fn to_wire(&self) -> String {
        match self {
            SearchTerm::Number(n) => n.to_string(),
            SearchTerm::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for SearchTerm {
    fn from(s: &str) -> Self {
        SearchTerm::Text(s.to_string())
    }
}

impl From<String> for SearchTerm {
    fn from(s: String) -> Self {
        SearchTerm::Text(s)
    }
}

impl From<i64> for SearchTerm {
    fn from(n: i64) -> Self {
        SearchTerm::Number(n.into())
    }
}

impl From<u64> for SearchTerm {
    fn from(n: u64) -> Self {
        SearchTerm::Number(n.into())
    }
}

/// Every query parameter any endpoint understands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub query: Option<SearchTerm>,
    pub filter: Option<Filter>,
    pub with: Vec<String>,
}

/// Parameters of `GET /customers`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerListParams {
    #[serde(default)]
    pub with: Vec<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub query: Option<SearchTerm>,
    pub filter: Option<Filter>,
}

/// Parameters of `GET /customers/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerParams {
    #[serde(default)]
    pub with: Vec<String>,
}

/// Parameters of the transaction list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub filter: Option<Filter>,
}

impl From<CustomerListParams> for QueryParams {
    fn from(p: CustomerListParams) -> Self {
        Self {
            page: p.page,
            limit: p.limit,
            query: p.query,
            filter: p.filter,
            with: p.with,
        }
    }
}

impl From<CustomerParams> for QueryParams {
    fn from(p: CustomerParams) -> Self {
        Self {
            with: p.with,
            ..Self::default()
        }
    }
}

impl From<TransactionListParams> for QueryParams {
    fn from(p: TransactionListParams) -> Self {
        Self {
            page: p.page,
            limit: p.limit,
            filter: p.filter,
            ..Self::default()
        }
    }
}

/// Validate `params` against `constraints` and produce the canonical
/// parameter list. Nothing is emitted for parameters the caller left unset.
pub fn encode(
    constraints: &ConstraintSet,
    params: &QueryParams,
) -> Result<Vec<(String, String)>, FilterValidationError> {
    let filter = params
        .filter
        .as_ref()
        .map(|f| FilterExpression::build(constraints, f))
        .transpose()?;

    if params.query.is_some() && !constraints.query_supported {
        return Err(FilterValidationError::new(
            "query",
            FilterErrorReason::UnsupportedParameter,
        ));
    }

    let mut out = Vec::new();

    if let Some(page) = params.page {
        if page == 0 {
            return Err(FilterValidationError::new("page", FilterErrorReason::OutOfRange));
        }
        out.push(("page".to_string(), page.to_string()));
    }

    if let Some(limit) = params.limit {
        if limit == 0 || limit > constraints.max_limit {
            return Err(FilterValidationError::new("limit", FilterErrorReason::OutOfRange));
        }
        out.push(("limit".to_string(), limit.to_string()));
    }

    if let Some(term) = &params.query {
        out.push(("query".to_string(), term.to_wire()));
    }

    if let Some(filter) = &filter {
        encode_filter(filter, &mut out);
    }

    if let Some(with) = encode_with(constraints, &params.with)? {
        out.push(("with".to_string(), with));
    }

    Ok(out)
}

/// Append the wire parameters for a validated filter.
///
/// `filter[f]=v` for a single value, `filter[f][]=v` once per list item,
/// `filter[f][from]` / `filter[f][to]` for each present range bound.
pub fn encode_filter(filter: &FilterExpression, out: &mut Vec<(String, String)>) {
    for (field, condition) in filter.conditions() {
        match condition {
            Condition::Equals(value) => {
                out.push((format!("filter[{field}]"), value.to_wire()));
            }
            Condition::AnyOf(values) => {
                let key = format!("filter[{field}][]");
                out.extend(values.iter().map(|v| (key.clone(), v.to_wire())));
            }
            Condition::Range { from, to } => {
                if let Some(from) = from {
                    out.push((format!("filter[{field}][from]"), from.to_wire()));
                }
                if let Some(to) = to {
                    out.push((format!("filter[{field}][to]"), to.to_wire()));
                }
            }
        }
    }
}

fn encode_with(
    constraints: &ConstraintSet,
    with: &[String],
) -> Result<Option<String>, FilterValidationError> {
    let mut names: Vec<&str> = Vec::with_capacity(with.len());
    for name in with {
        if !constraints.can_embed(name) {
            return Err(FilterValidationError::new(
                name.as_str(),
                FilterErrorReason::NotEmbeddable,
            ));
        }
        if !names.contains(&name.as_str()) {
            names.push(name);
        }
    }
    Ok((!names.is_empty()).then(|| names.join(",")))
}
