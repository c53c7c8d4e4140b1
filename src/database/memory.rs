//! In-memory storage gateways
//!
//! Backed by `tokio::sync::RwLock` maps. Used by the test suites and by the
//! binary when no `DATABASE_URL` is configured. Uniqueness of payment
//! references and merchant API keys is enforced the same way the Postgres
//! schema enforces it, by rejecting the write with a unique violation.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::error::{DatabaseError, DatabaseErrorKind};
use crate::payments::repository::{CustomerRepository, MerchantRepository, PaymentRepository};
use crate::payments::types::{Customer, Merchant, Pagination, Payment, PaymentStatus};

fn unique_violation(constraint: &str) -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::UniqueViolation {
        constraint: constraint.to_string(),
    })
}

/// Newest first, then the page window
fn paginate(mut payments: Vec<Payment>, page: Pagination) -> Vec<Payment> {
    payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    payments
        .into_iter()
        .skip(page.offset.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect()
}

#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<Uuid, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.payments.read().await.is_empty()
    }

    /// Overwrite a stored status without any transition check
    #[cfg(test)]
    pub(crate) async fn force_status(&self, id: Uuid, status: PaymentStatus) {
        if let Some(payment) = self.payments.write().await.get_mut(&id) {
            payment.status = status;
            payment.completed_at = (status == PaymentStatus::Completed).then_some(payment.updated_at);
        }
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), DatabaseError> {
        let mut payments = self.payments.write().await;

        if payments.contains_key(&payment.id) {
            return Err(unique_violation("payments_pkey"));
        }
        if let Some(reference) = &payment.reference {
            if payments
                .values()
                .any(|p| p.reference.as_deref() == Some(reference.as_str()))
            {
                return Err(unique_violation("payments_reference_key"));
            }
        }

        payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Payment>, DatabaseError> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Payment>, DatabaseError> {
        Ok(self
            .payments
            .read()
            .await
            .values()
            .find(|p| p.reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        new: PaymentStatus,
    ) -> Result<Option<Payment>, DatabaseError> {
        let mut payments = self.payments.write().await;

        let payment = match payments.get_mut(&id) {
            Some(payment) if payment.status == expected => payment,
            _ => return Ok(None),
        };

        let now = Utc::now();
        payment.status = new;
        payment.updated_at = now;
        payment.completed_at = (new == PaymentStatus::Completed).then_some(now);

        Ok(Some(payment.clone()))
    }

    async fn list_by_merchant(
        &self,
        merchant_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Payment>, DatabaseError> {
        let matching = self
            .payments
            .read()
            .await
            .values()
            .filter(|p| p.merchant_id == merchant_id)
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }

    async fn list_by_customer(
        &self,
        customer_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Payment>, DatabaseError> {
        let matching = self
            .payments
            .read()
            .await
            .values()
            .filter(|p| p.customer_id == customer_id)
            .cloned()
            .collect();
        Ok(paginate(matching, page))
    }
}

#[derive(Default)]
pub struct InMemoryMerchantRepository {
    merchants: RwLock<HashMap<Uuid, Merchant>>,
}

impl InMemoryMerchantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MerchantRepository for InMemoryMerchantRepository {
    async fn create(&self, merchant: &Merchant) -> Result<(), DatabaseError> {
        let mut merchants = self.merchants.write().await;

        if merchants.contains_key(&merchant.id) {
            return Err(unique_violation("merchants_pkey"));
        }
        if merchants.values().any(|m| m.api_key == merchant.api_key) {
            return Err(unique_violation("merchants_api_key_key"));
        }

        merchants.insert(merchant.id, merchant.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Merchant>, DatabaseError> {
        Ok(self.merchants.read().await.get(&id).cloned())
    }

    async fn get_by_api_key(&self, api_key: &str) -> Result<Option<Merchant>, DatabaseError> {
        Ok(self
            .merchants
            .read()
            .await
            .values()
            .find(|m| m.api_key == api_key)
            .cloned())
    }

    async fn update(&self, merchant: &Merchant) -> Result<Merchant, DatabaseError> {
        let mut merchants = self.merchants.write().await;

        if merchants
            .values()
            .any(|m| m.id != merchant.id && m.api_key == merchant.api_key)
        {
            return Err(unique_violation("merchants_api_key_key"));
        }

        let stored = merchants
            .get_mut(&merchant.id)
            .ok_or_else(|| DatabaseError::not_found("merchant", merchant.id))?;

        *stored = Merchant {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..merchant.clone()
        };
        Ok(stored.clone())
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut merchants = self.merchants.write().await;
        let merchant = merchants
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found("merchant", id))?;

        merchant.is_active = false;
        merchant.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<Uuid, Customer>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn create(&self, customer: &Customer) -> Result<(), DatabaseError> {
        let mut customers = self.customers.write().await;

        if customers.contains_key(&customer.id) {
            return Err(unique_violation("customers_pkey"));
        }

        customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, DatabaseError> {
        Ok(self
            .customers
            .read()
            .await
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn update(&self, customer: &Customer) -> Result<Customer, DatabaseError> {
        let mut customers = self.customers.write().await;
        let stored = customers
            .get_mut(&customer.id)
            .ok_or_else(|| DatabaseError::not_found("customer", customer.id))?;

        *stored = Customer {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..customer.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.customers
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::not_found("customer", id))
    }
}
