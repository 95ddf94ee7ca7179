//! Stateless HTTP request builder and response parser for the customers API.
//!
//! # Design
//! `CustomerApi` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Identifiers and query parameters are validated inside `build_*`, so an
//! invalid call never yields a request. Bodies are serialized as given.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::constraints::ResourceKind;
use crate::error::{ApiError, IdentifierValidationError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{self, CustomerListParams, CustomerParams, QueryParams, TransactionListParams};
use crate::types::{
    BonusPoints, BonusPointsChange, CustomerUpdate, CustomersBatch, CustomersMode, CustomersPage,
    Customer, NewCustomer, NewTransaction, SavedEntity, TransactionsBatch, TransactionsPage,
};

const CUSTOMERS_PATH: &str = "/api/v4/customers";

/// A positive integer identifier, checked before it is put into a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(i64);

impl ResourceId {
    pub fn new(parameter: &'static str, value: i64) -> Result<Self, IdentifierValidationError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(IdentifierValidationError::NonPositive { parameter, value })
        }
    }

    /// Parse an identifier that arrived as text (path segment, CLI argument).
    pub fn parse(parameter: &'static str, input: &str) -> Result<Self, IdentifierValidationError> {
        let value = input
            .trim()
            .parse::<i64>()
            .map_err(|_| IdentifierValidationError::Malformed {
                parameter,
                input: input.to_string(),
            })?;
        Self::new(parameter, value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything an endpoint accepts as an identifier: an integer, text holding
/// one, or an already checked `ResourceId`.
pub trait IntoResourceId: fmt::Debug {
    fn into_resource_id(self, parameter: &'static str) -> Result<ResourceId, IdentifierValidationError>;
}

impl IntoResourceId for ResourceId {
    fn into_resource_id(self, _: &'static str) -> Result<ResourceId, IdentifierValidationError> {
        Ok(self)
    }
}

impl IntoResourceId for i64 {
    fn into_resource_id(self, parameter: &'static str) -> Result<ResourceId, IdentifierValidationError> {
        ResourceId::new(parameter, self)
    }
}

impl IntoResourceId for i32 {
    fn into_resource_id(self, parameter: &'static str) -> Result<ResourceId, IdentifierValidationError> {
        ResourceId::new(parameter, self.into())
    }
}

impl IntoResourceId for &str {
    fn into_resource_id(self, parameter: &'static str) -> Result<ResourceId, IdentifierValidationError> {
        ResourceId::parse(parameter, self)
    }
}

impl IntoResourceId for String {
    fn into_resource_id(self, parameter: &'static str) -> Result<ResourceId, IdentifierValidationError> {
        ResourceId::parse(parameter, &self)
    }
}

/// Synchronous, stateless client for the customers API.
#[derive(Debug, Clone)]
pub struct CustomerApi {
    base_url: String,
}

impl CustomerApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_update_customers_mode(&self, mode: &CustomersMode) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Patch, "/mode", mode)
    }

    pub fn build_get_customers(&self, params: CustomerListParams) -> Result<HttpRequest, ApiError> {
        self.with_query("", ResourceKind::Customers, params.into())
    }

    pub fn build_get_customer_by_id(
        &self,
        id: impl IntoResourceId,
        params: CustomerParams,
    ) -> Result<HttpRequest, ApiError> {
        let id = id.into_resource_id("id")?;
        self.with_query(&format!("/{id}"), ResourceKind::Customers, params.into())
    }

    pub fn build_add_customers(&self, customers: &[NewCustomer]) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, "", customers)
    }

    pub fn build_update_customers(
        &self,
        customers: &[CustomerUpdate],
    ) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Patch, "", customers)
    }

    pub fn build_update_customer_by_id(
        &self,
        id: impl IntoResourceId,
        customer: &NewCustomer,
    ) -> Result<HttpRequest, ApiError> {
        let id = id.into_resource_id("id")?;
        self.with_body(HttpMethod::Patch, &format!("/{id}"), customer)
    }

    pub fn build_get_transactions(
        &self,
        params: TransactionListParams,
    ) -> Result<HttpRequest, ApiError> {
        self.with_query("/transactions", ResourceKind::Transactions, params.into())
    }

    pub fn build_get_transactions_by_customer_id(
        &self,
        customer_id: impl IntoResourceId,
        params: TransactionListParams,
    ) -> Result<HttpRequest, ApiError> {
        let customer_id = customer_id.into_resource_id("customer_id")?;
        self.with_query(
            &format!("/{customer_id}/transactions"),
            ResourceKind::Transactions,
            params.into(),
        )
    }

    pub fn build_add_transactions_to_customer(
        &self,
        customer_id: impl IntoResourceId,
        transactions: &[NewTransaction],
    ) -> Result<HttpRequest, ApiError> {
        let customer_id = customer_id.into_resource_id("customer_id")?;
        self.with_body(
            HttpMethod::Post,
            &format!("/{customer_id}/transactions"),
            transactions,
        )
    }

    pub fn build_delete_transaction_by_id(&self, id: impl IntoResourceId) -> Result<HttpRequest, ApiError> {
        let id = id.into_resource_id("id")?;
        Ok(self.request(HttpMethod::Delete, &format!("/transactions/{id}"), Vec::new(), None))
    }

    pub fn build_update_bonus_points_by_customer_id(
        &self,
        id: impl IntoResourceId,
        points: &BonusPointsChange,
    ) -> Result<HttpRequest, ApiError> {
        let id = id.into_resource_id("id")?;
        self.with_body(HttpMethod::Post, &format!("/{id}/bonus_points"), points)
    }

    pub fn parse_update_customers_mode(&self, response: HttpResponse) -> Result<CustomersMode, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    /// `204 No Content` means no customer matched.
    pub fn parse_get_customers(&self, response: HttpResponse) -> Result<CustomersPage, ApiError> {
        if check_status(&response, &[200, 204])? == 204 {
            return Ok(CustomersPage::default());
        }
        decode(&response)
    }

    pub fn parse_get_customer_by_id(&self, response: HttpResponse) -> Result<Customer, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_add_customers(&self, response: HttpResponse) -> Result<CustomersBatch, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_update_customers(&self, response: HttpResponse) -> Result<CustomersBatch, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_update_customer_by_id(&self, response: HttpResponse) -> Result<SavedEntity, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    /// `204 No Content` means no transaction matched.
    pub fn parse_get_transactions(&self, response: HttpResponse) -> Result<TransactionsPage, ApiError> {
        if check_status(&response, &[200, 204])? == 204 {
            return Ok(TransactionsPage::default());
        }
        decode(&response)
    }

    pub fn parse_get_transactions_by_customer_id(
        &self,
        response: HttpResponse,
    ) -> Result<TransactionsPage, ApiError> {
        self.parse_get_transactions(response)
    }

    pub fn parse_add_transactions_to_customer(
        &self,
        response: HttpResponse,
    ) -> Result<TransactionsBatch, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_delete_transaction_by_id(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[204])?;
        Ok(())
    }

    pub fn parse_update_bonus_points_by_customer_id(
        &self,
        response: HttpResponse,
    ) -> Result<BonusPoints, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    fn request(
        &self,
        method: HttpMethod,
        suffix: &str,
        query: Vec<(String, String)>,
        body: Option<String>,
    ) -> HttpRequest {
        let headers = match body {
            Some(_) => vec![("content-type".to_string(), "application/json".to_string())],
            None => Vec::new(),
        };
        HttpRequest {
            method,
            path: format!("{}{CUSTOMERS_PATH}{suffix}", self.base_url),
            query,
            headers,
            body,
        }
    }

    fn with_query(
        &self,
        suffix: &str,
        resource: ResourceKind,
        params: QueryParams,
    ) -> Result<HttpRequest, ApiError> {
        let query = query::encode(resource.constraints(), &params)?;
        Ok(self.request(HttpMethod::Get, suffix, query, None))
    }

    fn with_body<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        suffix: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.request(method, suffix, Vec::new(), Some(body)))
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
/// Returns the status on success so callers can tell 200 from 204.
fn check_status(response: &HttpResponse, expected: &[u16]) -> Result<u16, ApiError> {
    if expected.contains(&response.status) {
        return Ok(response.status);
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    warn!(status = response.status, ?expected, "unexpected response status");
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}
