//! Payment lifecycle service
//!
//! Validates creation preconditions, enforces the status state machine and
//! orchestrates the storage gateway. Holds no mutable state of its own, so a
//! single instance is shared across all request handlers.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::{self, error::DatabaseError};
use crate::error::{AppError, AppResult, DomainError, TransitionAction};
use crate::payments::repository::{CustomerRepository, MerchantRepository, PaymentRepository};
use crate::payments::types::{CreatePaymentRequest, Pagination, Payment, PaymentStatus};

/// Upper bound for a single storage call (5 seconds)
const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct PaymentServiceConfig {
    pub storage_timeout: Duration,
}

impl Default for PaymentServiceConfig {
    fn default() -> Self {
        Self {
            storage_timeout: Duration::from_millis(DEFAULT_STORAGE_TIMEOUT_MS),
        }
    }
}

pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    merchants: Arc<dyn MerchantRepository>,
    customers: Arc<dyn CustomerRepository>,
    config: PaymentServiceConfig,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        merchants: Arc<dyn MerchantRepository>,
        customers: Arc<dyn CustomerRepository>,
    ) -> Self {
        Self::with_config(payments, merchants, customers, PaymentServiceConfig::default())
    }

    pub fn with_config(
        payments: Arc<dyn PaymentRepository>,
        merchants: Arc<dyn MerchantRepository>,
        customers: Arc<dyn CustomerRepository>,
        config: PaymentServiceConfig,
    ) -> Self {
        Self {
            payments,
            merchants,
            customers,
            config,
        }
    }

    /// Create a pending payment.
    ///
    /// Preconditions are checked in order and the first failure wins: the
    /// merchant exists, the merchant is active, the customer exists. Nothing
    /// is persisted unless all three hold.
    pub async fn create_payment(&self, request: CreatePaymentRequest) -> AppResult<Payment> {
        let merchant = self
            .bounded(self.merchants.get_by_id(request.merchant_id))
            .await
            .map_err(|e| AppError::storage("get merchant", e))?
            .ok_or_else(|| {
                AppError::domain(DomainError::MerchantNotFound {
                    merchant_id: request.merchant_id,
                })
            })?;

        if !merchant.is_active {
            warn!(merchant_id = %merchant.id, "Payment rejected: merchant is not active");
            return Err(AppError::domain(DomainError::MerchantInactive {
                merchant_id: merchant.id,
            }));
        }

        self.bounded(self.customers.get_by_id(request.customer_id))
            .await
            .map_err(|e| AppError::storage("get customer", e))?
            .ok_or_else(|| {
                AppError::domain(DomainError::CustomerNotFound {
                    customer_id: request.customer_id,
                })
            })?;

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            merchant_id: request.merchant_id,
            customer_id: request.customer_id,
            amount: request.amount,
            currency: request.currency,
            method: request.method,
            status: PaymentStatus::Pending,
            description: request.description,
            reference: request.reference,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        self.bounded(self.payments.create(&payment))
            .await
            .map_err(|e| match &payment.reference {
                Some(reference) if e.is_unique_violation() => {
                    AppError::domain(DomainError::DuplicateReference {
                        reference: reference.clone(),
                    })
                    .with_cause(e)
                }
                _ => AppError::storage("create payment", e),
            })?;

        info!(
            payment_id = %payment.id,
            merchant_id = %payment.merchant_id,
            amount = payment.amount,
            currency = %payment.currency,
            method = %payment.method,
            "Payment created"
        );

        Ok(payment)
    }

    pub async fn get_payment(&self, id: Uuid) -> AppResult<Payment> {
        self.load_payment(id).await
    }

    pub async fn get_payment_by_reference(&self, reference: &str) -> AppResult<Payment> {
        self.bounded(self.payments.get_by_reference(reference))
            .await
            .map_err(|e| AppError::storage("get payment by reference", e))?
            .ok_or_else(|| {
                AppError::domain(DomainError::PaymentNotFound {
                    payment_id: reference.to_string(),
                })
            })
    }

    /// Complete a pending payment.
    ///
    /// There is no external authorization step; a pending payment is
    /// always approved.
    pub async fn process_payment(&self, id: Uuid) -> AppResult<Payment> {
        self.transition(id, TransitionAction::Process).await
    }

    /// Cancel a pending payment.
    pub async fn cancel_payment(&self, id: Uuid) -> AppResult<Payment> {
        self.transition(id, TransitionAction::Cancel).await
    }

    pub async fn get_merchant_payments(
        &self,
        merchant_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<Payment>> {
        let payments = self
            .bounded(self.payments.list_by_merchant(merchant_id, page))
            .await
            .map_err(|e| AppError::storage("get merchant payments", e))?;

        debug!(
            merchant_id = %merchant_id,
            limit = page.limit,
            offset = page.offset,
            count = payments.len(),
            "Listed merchant payments"
        );
        Ok(payments)
    }

    pub async fn get_customer_payments(
        &self,
        customer_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<Payment>> {
        self.bounded(self.payments.list_by_customer(customer_id, page))
            .await
            .map_err(|e| AppError::storage("get customer payments", e))
    }

    async fn transition(&self, id: Uuid, action: TransitionAction) -> AppResult<Payment> {
        let payment = self.load_payment(id).await?;
        let target = action.target();

        if !payment.status.can_transition_to(target) {
            return Err(invalid_transition(id, payment.status, action));
        }

        let updated = self
            .bounded(self.payments.update_status(id, payment.status, target))
            .await
            .map_err(|e| AppError::storage("update payment status", e))?;

        match updated {
            Some(updated) => {
                info!(
                    payment_id = %id,
                    from = %payment.status,
                    to = %updated.status,
                    "Payment status updated"
                );
                Ok(updated)
            }
            None => {
                // Another request moved the payment first; report what it became.
                let current = self.load_payment(id).await?;
                warn!(
                    payment_id = %id,
                    current = %current.status,
                    action = action.verb(),
                    "Conditional status update lost a concurrent race"
                );
                Err(invalid_transition(id, current.status, action))
            }
        }
    }

    async fn load_payment(&self, id: Uuid) -> AppResult<Payment> {
        self.bounded(self.payments.get_by_id(id))
            .await
            .map_err(|e| AppError::storage("get payment", e))?
            .ok_or_else(|| {
                AppError::domain(DomainError::PaymentNotFound {
                    payment_id: id.to_string(),
                })
            })
    }

    /// Upper bound applied to each storage call
    pub fn storage_timeout(&self) -> Duration {
        self.config.storage_timeout
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, DatabaseError>>,
    {
        database::bounded(self.config.storage_timeout, call).await
    }
}

fn invalid_transition(payment_id: Uuid, current: PaymentStatus, action: TransitionAction) -> AppError {
    AppError::domain(DomainError::InvalidStatusTransition {
        payment_id,
        current,
        action,
    })
}
