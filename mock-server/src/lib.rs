use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

const BASE: &str = "/api/v4/customers";
const DEFAULT_LIMIT: usize = 50;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub next_price: Option<f64>,
    pub status_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_deleted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub customer_id: i64,
    pub comment: Option<String>,
    pub price: Option<f64>,
    pub created_at: i64,
    pub is_deleted: bool,
}

#[derive(Deserialize)]
pub struct NewCustomer {
    #[serde(default)]
    pub name: String,
    pub next_price: Option<f64>,
    pub status_id: Option<i64>,
    pub created_at: Option<i64>,
    pub request_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CustomerChanges {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub next_price: Option<f64>,
    pub status_id: Option<i64>,
    pub request_id: Option<String>,
}

#[derive(Deserialize)]
pub struct NewTransaction {
    pub comment: Option<String>,
    pub price: Option<f64>,
    pub request_id: Option<String>,
}

#[derive(Deserialize)]
pub struct BonusPointsChange {
    #[serde(default)]
    pub redeem: i64,
    #[serde(default)]
    pub earn: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Mode {
    pub mode: String,
    pub is_enabled: bool,
}

#[derive(Default)]
pub struct Store {
    last_customer_id: i64,
    last_transaction_id: i64,
    customers: BTreeMap<i64, Customer>,
    transactions: BTreeMap<i64, Transaction>,
    bonus_points: BTreeMap<i64, i64>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/v4/customers", get(list_customers).post(add_customers).patch(update_customers))
        .route("/api/v4/customers/mode", patch(update_mode))
        .route("/api/v4/customers/transactions", get(list_transactions))
        .route("/api/v4/customers/transactions/{id}", delete(delete_transaction))
        .route("/api/v4/customers/{id}", get(get_customer).patch(update_customer))
        .route(
            "/api/v4/customers/{id}/transactions",
            get(list_customer_transactions).post(add_transactions),
        )
        .route("/api/v4/customers/{id}/bonus_points", post(update_bonus_points))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock CRM listening");
    axum::serve(listener, app()).await
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// The subset of list parameters the mock understands.
#[derive(Debug, Default, PartialEq)]
pub struct ListQuery {
    pub page: usize,
    pub limit: usize,
    pub search: Option<String>,
    pub ids: Vec<i64>,
    pub name: Option<String>,
    pub created_from: Option<i64>,
    pub created_to: Option<i64>,
    pub with: Vec<String>,
}

impl ListQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, StatusCode> {
        let mut q = ListQuery {
            page: 1,
            limit: DEFAULT_LIMIT,
            ..ListQuery::default()
        };
        let int = |v: &str| v.parse::<i64>().map_err(|_| StatusCode::BAD_REQUEST);
        for (key, value) in pairs {
            match key.as_str() {
                "page" => q.page = usize::try_from(int(value.as_str())?.max(1)).unwrap_or(usize::MAX),
                "limit" => q.limit = int(value.as_str())?.clamp(1, 250) as usize,
                "query" => q.search = Some(value.to_lowercase()),
                "filter[id]" | "filter[id][]" => q.ids.push(int(value.as_str())?),
                "filter[name]" => q.name = Some(value.clone()),
                "filter[created_at][from]" => q.created_from = Some(int(value.as_str())?),
                "filter[created_at][to]" => q.created_to = Some(int(value.as_str())?),
                "with" => q.with = value.split(',').map(str::to_string).collect(),
                _ => {}
            }
        }
        Ok(q)
    }

    fn matches_customer(&self, c: &Customer) -> bool {
        (self.ids.is_empty() || self.ids.contains(&c.id))
            && self.name.as_ref().is_none_or(|n| &c.name == n)
            && self.created_from.is_none_or(|from| c.created_at >= from)
            && self.created_to.is_none_or(|to| c.created_at <= to)
            && self.search.as_ref().is_none_or(|s| {
                c.name.to_lowercase().contains(s.as_str()) || c.id.to_string() == *s
            })
    }

    fn paginate<T: Clone>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.page.saturating_sub(1).saturating_mul(self.limit))
            .take(self.limit)
            .collect()
    }
}

/// Wraps a page of entities; an empty page is `204 No Content`.
fn page_response<T: Serialize>(collection: &str, page: usize, items: Vec<T>) -> Response {
    if items.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }
    Json(json!({
        "_page": page,
        "_links": {"self": {"href": format!("{BASE}?page={page}")}},
        "_embedded": {collection: items},
    }))
    .into_response()
}

fn customer_json(c: &Customer, with: &[String]) -> Value {
    let mut value = json!(c);
    let mut embedded = json!({"tags": [], "segments": []});
    for name in with {
        embedded[name.as_str()] = json!([]);
    }
    value["_links"] = json!({"self": {"href": format!("{BASE}/{}", c.id)}});
    value["_embedded"] = embedded;
    value
}

fn saved(id: i64, request_id: Option<String>) -> Value {
    json!({
        "id": id,
        "request_id": request_id,
        "_links": {"self": {"href": format!("{BASE}/{id}")}},
    })
}

async fn update_mode(Json(mode): Json<Mode>) -> Result<Json<Mode>, StatusCode> {
    match mode.mode.as_str() {
        "segments" | "periodicity" => Ok(Json(mode)),
        _ => Err(StatusCode::BAD_REQUEST),
    }
}

async fn list_customers(
    State(db): State<Db>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, StatusCode> {
    let q = ListQuery::from_pairs(&pairs)?;
    debug!(?q, "list customers");
    let store = db.read().await;
    let matching: Vec<&Customer> = store
        .customers
        .values()
        .filter(|c| !c.is_deleted && q.matches_customer(c))
        .collect();
    let items: Vec<Value> = q
        .paginate(matching)
        .into_iter()
        .map(|c| customer_json(c, &q.with))
        .collect();
    Ok(page_response("customers", q.page, items))
}

async fn add_customers(
    State(db): State<Db>,
    Json(input): Json<Vec<NewCustomer>>,
) -> Json<Value> {
    let mut store = db.write().await;
    let mut out = Vec::with_capacity(input.len());
    for item in input {
        store.last_customer_id += 1;
        let id = store.last_customer_id;
        let created_at = item.created_at.unwrap_or_else(now);
        store.customers.insert(
            id,
            Customer {
                id,
                name: item.name,
                next_price: item.next_price,
                status_id: item.status_id,
                created_at,
                updated_at: created_at,
                is_deleted: false,
            },
        );
        out.push(saved(id, item.request_id));
    }
    info!(count = out.len(), "customers added");
    Json(json!({"_embedded": {"customers": out}}))
}

fn apply_changes(customer: &mut Customer, changes: CustomerChanges) {
    if let Some(name) = changes.name {
        customer.name = name;
    }
    if let Some(price) = changes.next_price {
        customer.next_price = Some(price);
    }
    if let Some(status) = changes.status_id {
        customer.status_id = Some(status);
    }
    customer.updated_at = now();
}

async fn update_customers(
    State(db): State<Db>,
    Json(input): Json<Vec<CustomerChanges>>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = db.write().await;
    let mut out = Vec::with_capacity(input.len());
    for changes in input {
        let id = changes.id.ok_or(StatusCode::BAD_REQUEST)?;
        let request_id = changes.request_id.clone();
        let customer = store.customers.get_mut(&id).ok_or(StatusCode::BAD_REQUEST)?;
        apply_changes(customer, changes);
        out.push(saved(id, request_id));
    }
    Ok(Json(json!({"_embedded": {"customers": out}})))
}

#[derive(Deserialize)]
struct WithParam {
    with: Option<String>,
}

async fn get_customer(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Query(params): Query<WithParam>,
) -> Result<Json<Value>, StatusCode> {
    let with: Vec<String> = params
        .with
        .map(|w| w.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    let store = db.read().await;
    store
        .customers
        .get(&id)
        .filter(|c| !c.is_deleted)
        .map(|c| Json(customer_json(c, &with)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_customer(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(changes): Json<CustomerChanges>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = db.write().await;
    let request_id = changes.request_id.clone();
    let customer = store.customers.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    apply_changes(customer, changes);
    Ok(Json(saved(id, request_id)))
}

fn transaction_page(store: &Store, q: &ListQuery, customer_id: Option<i64>) -> Response {
    let matching: Vec<&Transaction> = store
        .transactions
        .values()
        .filter(|t| !t.is_deleted)
        .filter(|t| customer_id.is_none_or(|id| t.customer_id == id))
        .filter(|t| q.ids.is_empty() || q.ids.contains(&t.id))
        .collect();
    page_response("transactions", q.page, q.paginate(matching))
}

async fn list_transactions(
    State(db): State<Db>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, StatusCode> {
    let q = ListQuery::from_pairs(&pairs)?;
    let store = db.read().await;
    Ok(transaction_page(&store, &q, None))
}

async fn list_customer_transactions(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, StatusCode> {
    let q = ListQuery::from_pairs(&pairs)?;
    let store = db.read().await;
    if !store.customers.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(transaction_page(&store, &q, Some(id)))
}

async fn add_transactions(
    State(db): State<Db>,
    Path(customer_id): Path<i64>,
    Json(input): Json<Vec<NewTransaction>>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = db.write().await;
    if !store.customers.contains_key(&customer_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let mut out = Vec::with_capacity(input.len());
    for item in input {
        store.last_transaction_id += 1;
        let id = store.last_transaction_id;
        store.transactions.insert(
            id,
            Transaction {
                id,
                customer_id,
                comment: item.comment,
                price: item.price,
                created_at: now(),
                is_deleted: false,
            },
        );
        out.push(json!({"id": id, "request_id": item.request_id}));
    }
    Ok(Json(json!({"_embedded": {"transactions": out}})))
}

async fn delete_transaction(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store
        .transactions
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_bonus_points(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(change): Json<BonusPointsChange>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = db.write().await;
    if !store.customers.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let total = store.bonus_points.entry(id).or_insert(0);
    if change.redeem > *total {
        return Err(StatusCode::BAD_REQUEST);
    }
    *total += change.earn - change.redeem;
    Ok(Json(json!({"bonus_points": *total})))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn customer(id: i64, name: &str, created_at: i64) -> Customer {
        Customer {
            id,
            name: name.to_string(),
            next_price: None,
            status_id: None,
            created_at,
            updated_at: created_at,
            is_deleted: false,
        }
    }

    #[test]
    fn list_query_defaults() {
        let q = ListQuery::from_pairs(&[]).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert!(q.ids.is_empty());
    }

    #[test]
    fn list_query_reads_bracketed_filters() {
        let q = ListQuery::from_pairs(&pairs(&[
            ("page", "2"),
            ("limit", "10"),
            ("filter[id][]", "1"),
            ("filter[id][]", "3"),
            ("filter[created_at][from]", "1000"),
            ("with", "contacts,companies"),
        ]))
        .unwrap();
        assert_eq!(q.page, 2);
        assert_eq!(q.limit, 10);
        assert_eq!(q.ids, vec![1, 3]);
        assert_eq!(q.created_from, Some(1000));
        assert_eq!(q.with, vec!["contacts", "companies"]);
    }

    #[test]
    fn list_query_rejects_non_numeric_ids() {
        let err = ListQuery::from_pairs(&pairs(&[("filter[id][]", "abc")])).unwrap_err();
        assert_eq!(err, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn customer_matching() {
        let q = ListQuery::from_pairs(&pairs(&[
            ("filter[created_at][from]", "1000"),
            ("filter[created_at][to]", "2000"),
        ]))
        .unwrap();
        assert!(q.matches_customer(&customer(1, "A", 1500)));
        assert!(!q.matches_customer(&customer(2, "B", 2500)));

        let q = ListQuery::from_pairs(&pairs(&[("query", "ACME")])).unwrap();
        assert!(q.matches_customer(&customer(3, "Acme Ltd", 0)));
        assert!(!q.matches_customer(&customer(4, "Other", 0)));
    }

    #[test]
    fn pagination_skips_earlier_pages() {
        let q = ListQuery::from_pairs(&pairs(&[("page", "2"), ("limit", "2")])).unwrap();
        assert_eq!(q.paginate(vec![1, 2, 3, 4, 5]), vec![3, 4]);
    }

    #[test]
    fn pages_far_past_the_end_are_empty() {
        let q = ListQuery::from_pairs(&pairs(&[
            ("page", "9223372036854775807"),
            ("limit", "250"),
        ]))
        .unwrap();
        assert!(q.paginate(vec![1, 2, 3]).is_empty());
    }

    #[test]
    fn customer_json_carries_links_and_requested_embeds() {
        let value = customer_json(&customer(9, "Z", 0), &["contacts".to_string()]);
        assert_eq!(value["_links"]["self"]["href"], "/api/v4/customers/9");
        assert!(value["_embedded"]["contacts"].as_array().unwrap().is_empty());
        assert!(value["_embedded"].get("companies").is_none());
    }
}
