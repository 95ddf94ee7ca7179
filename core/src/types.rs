//! Domain DTOs for the customers API.
//!
//! # Design
//! Request payloads only serialize the fields the caller set, so a partial
//! update stays partial on the wire. Response types are lenient: every
//! attribute the server may omit is optional or defaulted, and unknown
//! attributes are ignored. The mock-server defines its own copies of these
//! shapes; the integration tests catch drift between the two.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A hypermedia link (`{"href": ...}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    pub href: String,
}

/// Link relations attached to collections and entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<Link>,
}

/// An embedded related entity. Only `id` is guaranteed; everything else the
/// server sends is kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedEntity {
    pub id: i64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CustomersModeKind {
    Segments,
    Periodicity,
}

/// Body and response of `PATCH /customers/mode`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomersMode {
    pub mode: CustomersModeKind,
    pub is_enabled: bool,
}

/// Related collections inlined into a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerEmbedded {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<EmbeddedEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<EmbeddedEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<EmbeddedEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub companies: Vec<EmbeddedEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog_elements: Vec<EmbeddedEntity>,
}

/// A customer as returned by the list and get endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub next_price: Option<f64>,
    pub next_date: Option<i64>,
    pub responsible_user_id: Option<i64>,
    pub status_id: Option<i64>,
    pub periodicity: Option<i64>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub closest_task_at: Option<i64>,
    #[serde(default)]
    pub is_deleted: bool,
    pub ltv: Option<f64>,
    pub purchases_count: Option<i64>,
    pub average_check: Option<f64>,
    pub account_id: Option<i64>,
    pub custom_fields_values: Option<Vec<Value>>,
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(rename = "_embedded", default)]
    pub embedded: CustomerEmbedded,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomersEmbedded {
    #[serde(default)]
    pub customers: Vec<Customer>,
}

/// Response of `GET /customers`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomersPage {
    #[serde(rename = "_page")]
    pub page: Option<u32>,
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(rename = "_embedded", default)]
    pub embedded: CustomersEmbedded,
}

impl CustomersPage {
    pub fn customers(&self) -> &[Customer] {
        &self.embedded.customers
    }
}

/// Tags and segments attached to a customer on create/update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerEmbeddedInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<EmbeddedEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<EmbeddedEntity>,
}

/// Payload for adding a customer, and for updating one by id. Only the
/// fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewCustomer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periodicity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields_values: Option<Vec<Value>>,
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<CustomerEmbeddedInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Item of a batch customer update; `id` selects the customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: NewCustomer,
}

/// Id (and echoed `request_id`) of an entity the server created or updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedEntity {
    pub id: i64,
    pub request_id: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedCustomers {
    #[serde(default)]
    pub customers: Vec<SavedEntity>,
}

/// Response of the batch customer create/update endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomersBatch {
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(rename = "_embedded", default)]
    pub embedded: SavedCustomers,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionEmbedded {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customers: Vec<EmbeddedEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog_elements: Vec<EmbeddedEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub comment: Option<String>,
    pub price: Option<f64>,
    pub completed_at: Option<i64>,
    pub customer_id: Option<i64>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub is_deleted: bool,
    pub account_id: Option<i64>,
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(rename = "_embedded", default)]
    pub embedded: TransactionEmbedded,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionsEmbedded {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Response of the transaction list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionsPage {
    #[serde(rename = "_page")]
    pub page: Option<u32>,
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(rename = "_embedded", default)]
    pub embedded: TransactionsEmbedded,
}

impl TransactionsPage {
    pub fn transactions(&self) -> &[Transaction] {
        &self.embedded.transactions
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionEmbeddedInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog_elements: Vec<EmbeddedEntity>,
}

/// Payload for adding a transaction to a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<TransactionEmbeddedInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedTransactions {
    // Some API versions report the new transactions under `customers`.
    #[serde(default, alias = "customers")]
    pub transactions: Vec<SavedEntity>,
}

/// Response of `POST /customers/{id}/transactions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionsBatch {
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(rename = "_embedded", default)]
    pub embedded: SavedTransactions,
}

/// Body of `POST /customers/{id}/bonus_points`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BonusPointsChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeem: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earn: Option<i64>,
}

/// The customer's bonus point total after the change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BonusPoints {
    pub bonus_points: i64,
}
