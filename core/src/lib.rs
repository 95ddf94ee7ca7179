//! Typed bindings for a CRM's customers and transactions API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip, either by hand between `build_*` and `parse_*` or
//! by plugging a `Transport` into `CustomerService`.
//!
//! # Design
//! - `constraints` declares, per resource, which fields may be filtered and
//!   how; `filter` validates caller filters against it; `query` turns the
//!   result, plus pagination, search and embedding, into a canonical
//!   parameter list.
//! - `CustomerApi` is stateless: it holds only `base_url`.
//! - All validation happens while building a request, so invalid input never
//!   reaches the transport.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod constraints;
pub mod error;
pub mod filter;
pub mod http;
pub mod query;
pub mod service;
pub mod types;

pub use client::{CustomerApi, IntoResourceId, ResourceId};
pub use constraints::{ConstraintSet, FieldGroup, RangeKind, ResourceKind};
pub use error::{
    ApiError, FilterErrorReason, FilterValidationError, IdentifierValidationError, TransportError,
};
pub use filter::{Condition, Directive, Filter, FilterExpression, Scalar};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use query::{CustomerListParams, CustomerParams, QueryParams, SearchTerm, TransactionListParams};
pub use service::CustomerService;
pub use types::{
    BonusPoints, BonusPointsChange, Customer, CustomerUpdate, CustomersBatch, CustomersMode,
    CustomersModeKind, CustomersPage, NewCustomer, NewTransaction, SavedEntity, Transaction,
    TransactionsBatch, TransactionsPage,
};
