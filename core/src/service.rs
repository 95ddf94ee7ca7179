//! One-call endpoint bindings on top of a caller-supplied `Transport`.
//!
//! Each method validates and builds the request with `CustomerApi`, hands it
//! to the transport, and parses the response. Validation failures return
//! before the transport is touched; transport failures are passed through.

use tracing::{debug, instrument};

use crate::client::{CustomerApi, IntoResourceId};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::query::{CustomerListParams, CustomerParams, TransactionListParams};
use crate::types::{
    BonusPoints, BonusPointsChange, Customer, CustomerUpdate, CustomersBatch, CustomersMode,
    CustomersPage, NewCustomer, NewTransaction, SavedEntity, TransactionsBatch, TransactionsPage,
};

#[derive(Debug, Clone)]
pub struct CustomerService<T> {
    api: CustomerApi,
    transport: T,
}

impl<T: Transport> CustomerService<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            api: CustomerApi::new(base_url),
            transport,
        }
    }

    pub fn api(&self) -> &CustomerApi {
        &self.api
    }

    #[instrument(skip(self))]
    pub fn update_customers_mode(&self, mode: &CustomersMode) -> Result<CustomersMode, ApiError> {
        let response = self.send(self.api.build_update_customers_mode(mode)?)?;
        self.api.parse_update_customers_mode(response)
    }

    #[instrument(skip(self))]
    pub fn get_customers(&self, params: CustomerListParams) -> Result<CustomersPage, ApiError> {
        let response = self.send(self.api.build_get_customers(params)?)?;
        self.api.parse_get_customers(response)
    }

    #[instrument(skip(self))]
    pub fn get_customer_by_id(
        &self,
        id: impl IntoResourceId,
        params: CustomerParams,
    ) -> Result<Customer, ApiError> {
        let response = self.send(self.api.build_get_customer_by_id(id, params)?)?;
        self.api.parse_get_customer_by_id(response)
    }

    #[instrument(skip(self, customers), fields(count = customers.len()))]
    pub fn add_customers(&self, customers: &[NewCustomer]) -> Result<CustomersBatch, ApiError> {
        let response = self.send(self.api.build_add_customers(customers)?)?;
        self.api.parse_add_customers(response)
    }

    #[instrument(skip(self, customers), fields(count = customers.len()))]
    pub fn update_customers(&self, customers: &[CustomerUpdate]) -> Result<CustomersBatch, ApiError> {
        let response = self.send(self.api.build_update_customers(customers)?)?;
        self.api.parse_update_customers(response)
    }

    #[instrument(skip(self, customer))]
    pub fn update_customer_by_id(
        &self,
        id: impl IntoResourceId,
        customer: &NewCustomer,
    ) -> Result<SavedEntity, ApiError> {
        let response = self.send(self.api.build_update_customer_by_id(id, customer)?)?;
        self.api.parse_update_customer_by_id(response)
    }

    #[instrument(skip(self))]
    pub fn get_transactions(
        &self,
        params: TransactionListParams,
    ) -> Result<TransactionsPage, ApiError> {
        let response = self.send(self.api.build_get_transactions(params)?)?;
        self.api.parse_get_transactions(response)
    }

    #[instrument(skip(self))]
    pub fn get_transactions_by_customer_id(
        &self,
        customer_id: impl IntoResourceId,
        params: TransactionListParams,
    ) -> Result<TransactionsPage, ApiError> {
        let request = self
            .api
            .build_get_transactions_by_customer_id(customer_id, params)?;
        let response = self.send(request)?;
        self.api.parse_get_transactions_by_customer_id(response)
    }

    #[instrument(skip(self, transactions), fields(count = transactions.len()))]
    pub fn add_transactions_to_customer(
        &self,
        customer_id: impl IntoResourceId,
        transactions: &[NewTransaction],
    ) -> Result<TransactionsBatch, ApiError> {
        let request = self
            .api
            .build_add_transactions_to_customer(customer_id, transactions)?;
        let response = self.send(request)?;
        self.api.parse_add_transactions_to_customer(response)
    }

    #[instrument(skip(self))]
    pub fn delete_transaction_by_id(&self, id: impl IntoResourceId) -> Result<(), ApiError> {
        let response = self.send(self.api.build_delete_transaction_by_id(id)?)?;
        self.api.parse_delete_transaction_by_id(response)
    }

    #[instrument(skip(self))]
    pub fn update_bonus_points_by_customer_id(
        &self,
        id: impl IntoResourceId,
        points: &BonusPointsChange,
    ) -> Result<BonusPoints, ApiError> {
        let request = self.api.build_update_bonus_points_by_customer_id(id, points)?;
        let response = self.send(request)?;
        self.api.parse_update_bonus_points_by_customer_id(response)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url(), "sending request");
        let response = self.transport.send(request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }
}
