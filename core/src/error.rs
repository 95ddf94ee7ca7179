//! Error types for the customers API client.
//!
//! # Design
//! Validation failures (`FilterValidationError`, `IdentifierValidationError`)
//! are raised while building a request, before any transport is involved.
//! Everything that happens after the request leaves the core lands in one of
//! the response-side `ApiError` variants or in `TransportError`, which is
//! passed through untouched.

use std::fmt;

use thiserror::Error;

/// Why a filter, pagination, search or embedding parameter was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterErrorReason {
    /// The field is not declared for the resource at all.
    UnknownField,
    /// The field is declared but may never be filtered on.
    ExcludedField,
    /// A range directive on an exact field, or a value/list on a range field.
    WrongDirectiveKind,
    /// An exact field was given an empty list of values.
    EmptyList,
    /// A range field was given neither `from` nor `to`.
    EmptyRange,
    /// An exact value that has no wire form (a NaN or infinite number).
    InvalidValue,
    /// A range bound does not match the field's underlying type.
    InvalidBound,
    /// Both bounds are present and `from` is greater than `to`.
    InvertedRange,
    /// The resource does not accept this parameter (e.g. free-text search).
    UnsupportedParameter,
    /// `page` or `limit` is outside the range the resource accepts.
    OutOfRange,
    /// The sub-resource is not in the resource's embedding whitelist.
    NotEmbeddable,
}

impl fmt::Display for FilterErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FilterErrorReason::UnknownField => "unknown field",
            FilterErrorReason::ExcludedField => "field is excluded from filtering",
            FilterErrorReason::WrongDirectiveKind => "wrong directive kind",
            FilterErrorReason::EmptyList => "empty list",
            FilterErrorReason::EmptyRange => "empty range",
            FilterErrorReason::InvalidValue => "invalid value",
            FilterErrorReason::InvalidBound => "invalid range bound",
            FilterErrorReason::InvertedRange => "inverted range",
            FilterErrorReason::UnsupportedParameter => "unsupported parameter",
            FilterErrorReason::OutOfRange => "value out of range",
            FilterErrorReason::NotEmbeddable => "not embeddable",
        };
        f.write_str(text)
    }
}

/// A query parameter failed validation against the resource's constraint set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid filter on `{field}`: {reason}")]
pub struct FilterValidationError {
    /// The offending field, or the parameter name (`page`, `query`, `with`, ...).
    pub field: String,
    pub reason: FilterErrorReason,
}

impl FilterValidationError {
    pub fn new(field: impl Into<String>, reason: FilterErrorReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

/// A resource identifier was rejected before a path was built from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierValidationError {
    #[error("identifier `{parameter}` must be a positive integer, got {value}")]
    NonPositive { parameter: &'static str, value: i64 },

    #[error("identifier `{parameter}` is not an integer: {input:?}")]
    Malformed { parameter: &'static str, input: String },
}

/// Failure reported by a `Transport` implementation (connection refused,
/// timeout, TLS, ...). Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failed: {0}")]
pub struct TransportError(pub String);

/// Errors returned by `CustomerApi` and `CustomerService`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Filter(#[from] FilterValidationError),

    #[error(transparent)]
    Identifier(#[from] IdentifierValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a status the endpoint does not expect.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// True for errors detected locally, before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Filter(_) | ApiError::Identifier(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_error_names_field_and_reason() {
        let err = FilterValidationError::new("price", FilterErrorReason::ExcludedField);
        assert_eq!(
            err.to_string(),
            "invalid filter on `price`: field is excluded from filtering"
        );
    }

    #[test]
    fn validation_errors_convert_into_api_error() {
        let err: ApiError = FilterValidationError::new("id", FilterErrorReason::EmptyList).into();
        assert!(err.is_validation());

        let err: ApiError = IdentifierValidationError::NonPositive {
            parameter: "id",
            value: 0,
        }
        .into();
        assert!(err.is_validation());

        let err: ApiError = TransportError("connection refused".to_string()).into();
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "transport failed: connection refused");
    }
}
