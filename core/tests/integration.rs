//! Full customers/transactions lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every endpoint
//! through `CustomerService` with a ureq-backed `Transport`. Validates that
//! request building, query serialization and response parsing work
//! end-to-end with the actual server.

use crm_core::{
    ApiError, BonusPointsChange, CustomerListParams, CustomerParams, CustomerService,
    CustomerUpdate, CustomersMode, CustomersModeKind, Filter, FilterErrorReason, HttpMethod,
    HttpRequest, HttpResponse, NewCustomer, NewTransaction, TransactionListParams, Transport,
    TransportError,
};

/// Executes requests with ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = req.url();
        let result = match (req.method, req.body) {
            (HttpMethod::Get, _) => self.agent.get(&url).call(),
            (HttpMethod::Delete, _) => self.agent.delete(&url).call(),
            (HttpMethod::Post, Some(body)) => self
                .agent
                .post(&url)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => self.agent.post(&url).send_empty(),
            (HttpMethod::Patch, Some(body)) => self
                .agent
                .patch(&url)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Patch, None) => self.agent.patch(&url).send_empty(),
        };
        let mut response = result.map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn new_customer(name: &str, created_at: i64) -> NewCustomer {
    NewCustomer {
        name: Some(name.to_string()),
        created_at: Some(created_at),
        request_id: Some(format!("req-{name}")),
        ..NewCustomer::default()
    }
}

fn names(page: &crm_core::CustomersPage) -> Vec<&str> {
    page.customers().iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn customer_lifecycle() {
    let addr = start_server();
    let service = CustomerService::new(&format!("http://{addr}"), UreqTransport::new());

    // Step 1: empty account answers 204, which reads as an empty page.
    let page = service.get_customers(CustomerListParams::default()).unwrap();
    assert!(page.customers().is_empty(), "expected empty list");

    // Step 2: toggle the customers mode.
    let mode = CustomersMode {
        mode: CustomersModeKind::Periodicity,
        is_enabled: true,
    };
    assert_eq!(service.update_customers_mode(&mode).unwrap(), mode);

    // Step 3: batch create.
    let created = service
        .add_customers(&[
            new_customer("old", 500),
            new_customer("mid", 1500),
            new_customer("new", 2500),
        ])
        .unwrap();
    let ids: Vec<i64> = created.embedded.customers.iter().map(|c| c.id).collect();
    assert_eq!(ids, [1, 2, 3]);
    assert_eq!(created.embedded.customers[0].request_id.as_deref(), Some("req-old"));

    // Step 4: filter by an id list.
    let page = service
        .get_customers(CustomerListParams {
            filter: Some(Filter::new().any_of("id", [1, 3])),
            ..CustomerListParams::default()
        })
        .unwrap();
    assert_eq!(names(&page), ["old", "new"]);

    // Step 5: filter by a created_at range given as RFC 3339 and epoch.
    let page = service
        .get_customers(CustomerListParams {
            filter: Some(Filter::new().between("created_at", "1970-01-01T00:16:40Z", 2000)),
            ..CustomerListParams::default()
        })
        .unwrap();
    assert_eq!(names(&page), ["mid"]);

    // Step 6: pagination and free-text search.
    let page = service
        .get_customers(CustomerListParams {
            page: Some(2),
            limit: Some(2),
            ..CustomerListParams::default()
        })
        .unwrap();
    assert_eq!(page.page, Some(2));
    assert_eq!(names(&page), ["new"]);

    let page = service
        .get_customers(CustomerListParams {
            query: Some("MI".into()),
            ..CustomerListParams::default()
        })
        .unwrap();
    assert_eq!(names(&page), ["mid"]);

    // Step 7: get one with embedded contacts.
    let customer = service
        .get_customer_by_id(
            2,
            CustomerParams {
                with: vec!["contacts".to_string()],
            },
        )
        .unwrap();
    assert_eq!(customer.name, "mid");
    assert_eq!(customer.created_at, Some(1500));

    // Step 8: update by id, then batch update.
    let saved = service
        .update_customer_by_id(
            2,
            &NewCustomer {
                name: Some("middle".to_string()),
                ..NewCustomer::default()
            },
        )
        .unwrap();
    assert_eq!(saved.id, 2);

    let batch = service
        .update_customers(&[CustomerUpdate {
            id: Some(3),
            fields: NewCustomer {
                status_id: Some(142),
                ..NewCustomer::default()
            },
        }])
        .unwrap();
    assert_eq!(batch.embedded.customers[0].id, 3);

    let customer = service.get_customer_by_id(3, CustomerParams::default()).unwrap();
    assert_eq!(customer.status_id, Some(142));
    let customer = service.get_customer_by_id(2, CustomerParams::default()).unwrap();
    assert_eq!(customer.name, "middle");

    // Step 9: bonus points.
    let change = BonusPointsChange {
        earn: Some(10),
        ..BonusPointsChange::default()
    };
    let points = service.update_bonus_points_by_customer_id(1, &change).unwrap();
    assert_eq!(points.bonus_points, 10);

    // Step 10: unknown customer.
    let err = service
        .get_customer_by_id(999, CustomerParams::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[test]
fn transaction_lifecycle() {
    let addr = start_server();
    let service = CustomerService::new(&format!("http://{addr}"), UreqTransport::new());

    service.add_customers(&[new_customer("buyer", 100)]).unwrap();

    // Step 1: add two transactions.
    let batch = service
        .add_transactions_to_customer(
            1,
            &[
                NewTransaction {
                    price: Some(19.5),
                    comment: Some("first".to_string()),
                    ..NewTransaction::default()
                },
                NewTransaction {
                    price: Some(5.0),
                    ..NewTransaction::default()
                },
            ],
        )
        .unwrap();
    let ids: Vec<i64> = batch.embedded.transactions.iter().map(|t| t.id).collect();
    assert_eq!(ids, [1, 2]);

    // Step 2: list for the customer, then account-wide filtered by id.
    let page = service
        .get_transactions_by_customer_id(1, TransactionListParams::default())
        .unwrap();
    assert_eq!(page.transactions().len(), 2);
    assert_eq!(page.transactions()[0].comment.as_deref(), Some("first"));

    let page = service
        .get_transactions(TransactionListParams {
            filter: Some(Filter::new().any_of("id", [2])),
            ..TransactionListParams::default()
        })
        .unwrap();
    assert_eq!(page.transactions().len(), 1);
    assert_eq!(page.transactions()[0].id, 2);

    // Step 3: filtering outside `id` fails locally.
    let err = service
        .get_transactions(TransactionListParams {
            filter: Some(Filter::new().eq("price", 5)),
            ..TransactionListParams::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Filter(ref e) if e.field == "price" && e.reason == FilterErrorReason::ExcludedField
    ));

    // Step 4: delete, then delete again.
    service.delete_transaction_by_id(1).unwrap();
    let err = service.delete_transaction_by_id(1).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 5: only the second transaction remains.
    let page = service
        .get_transactions(TransactionListParams::default())
        .unwrap();
    assert_eq!(page.transactions().len(), 1);

    // Step 6: unknown customer.
    let err = service
        .get_transactions_by_customer_id(42, TransactionListParams::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let service = CustomerService::new(&format!("http://{addr}"), UreqTransport::new());

    let err = service.delete_transaction_by_id(1).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
