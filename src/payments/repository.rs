//! Storage gateway traits
//!
//! The lifecycle service depends only on these. Lookups return `Ok(None)`
//! when the row does not exist, which is a normal business outcome; `Err`
//! is reserved for storage faults.

use crate::database::error::DatabaseError;
use crate::payments::types::{Customer, Merchant, Pagination, Payment, PaymentStatus};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<(), DatabaseError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Payment>, DatabaseError>;

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Payment>, DatabaseError>;

    /// Move a payment from `expected` to `new` in a single conditional write.
    ///
    /// Stamps `updated_at`, and sets `completed_at` only when `new` is
    /// `Completed`. Returns `Ok(None)` if the payment is missing or its stored
    /// status is no longer `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        new: PaymentStatus,
    ) -> Result<Option<Payment>, DatabaseError>;

    /// Newest first
    async fn list_by_merchant(
        &self,
        merchant_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Payment>, DatabaseError>;

    /// Newest first
    async fn list_by_customer(
        &self,
        customer_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Payment>, DatabaseError>;
}

#[async_trait]
pub trait MerchantRepository: Send + Sync {
    async fn create(&self, merchant: &Merchant) -> Result<(), DatabaseError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Merchant>, DatabaseError>;

    async fn get_by_api_key(&self, api_key: &str) -> Result<Option<Merchant>, DatabaseError>;

    async fn update(&self, merchant: &Merchant) -> Result<Merchant, DatabaseError>;

    /// Soft delete: clears `is_active`, the row stays.
    async fn deactivate(&self, id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, customer: &Customer) -> Result<(), DatabaseError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, DatabaseError>;

    async fn update(&self, customer: &Customer) -> Result<Customer, DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError>;
}
