use crate::database::error::DatabaseError;
use crate::payments::repository::PaymentRepository;
use crate::payments::types::{Pagination, Payment, PaymentMethod, PaymentStatus};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "id, merchant_id, customer_id, amount, currency, method, status, \
     description, reference, created_at, updated_at, completed_at";

/// Row shape of the `payments` table; enums are stored as TEXT
#[derive(Debug, Clone, FromRow)]
struct PaymentRow {
    id: Uuid,
    merchant_id: Uuid,
    customer_id: Uuid,
    amount: i64,
    currency: String,
    method: String,
    status: String,
    description: String,
    reference: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let method: PaymentMethod = row.method.parse().map_err(DatabaseError::decode)?;
        let status: PaymentStatus = row.status.parse().map_err(DatabaseError::decode)?;

        Ok(Payment {
            id: row.id,
            merchant_id: row.merchant_id,
            customer_id: row.customer_id,
            amount: row.amount,
            currency: row.currency,
            method,
            status,
            description: row.description,
            reference: row.reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

fn into_payments(rows: Vec<PaymentRow>) -> Result<Vec<Payment>, DatabaseError> {
    rows.into_iter().map(Payment::try_from).collect()
}

/// Postgres-backed payment storage
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO payments
             (id, merchant_id, customer_id, amount, currency, method, status,
              description, reference, created_at, updated_at, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(payment.id)
        .bind(payment.merchant_id)
        .bind(payment.customer_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.description)
        .bind(&payment.reference)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .bind(payment.completed_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Payment>, DatabaseError> {
        let query = format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS);
        sqlx::query_as::<_, PaymentRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?
            .map(Payment::try_from)
            .transpose()
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Payment>, DatabaseError> {
        let query = format!("SELECT {} FROM payments WHERE reference = $1", PAYMENT_COLUMNS);
        sqlx::query_as::<_, PaymentRow>(&query)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?
            .map(Payment::try_from)
            .transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        new: PaymentStatus,
    ) -> Result<Option<Payment>, DatabaseError> {
        let query = format!(
            "UPDATE payments
             SET status = $3,
                 updated_at = NOW(),
                 completed_at = CASE WHEN $3::text = 'completed' THEN NOW() ELSE NULL END
             WHERE id = $1 AND status = $2
             RETURNING {}",
            PAYMENT_COLUMNS
        );
        sqlx::query_as::<_, PaymentRow>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(new.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?
            .map(Payment::try_from)
            .transpose()
    }

    async fn list_by_merchant(
        &self,
        merchant_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Payment>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM payments
             WHERE merchant_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
            PAYMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&query)
            .bind(merchant_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        into_payments(rows)
    }

    async fn list_by_customer(
        &self,
        customer_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Payment>, DatabaseError> {
        let query = format!(
            "SELECT {} FROM payments
             WHERE customer_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
            PAYMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&query)
            .bind(customer_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        into_payments(rows)
    }
}
