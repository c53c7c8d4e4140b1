use crate::database::error::DatabaseError;
use crate::payments::repository::CustomerRepository;
use crate::payments::types::Customer;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres-backed customer storage
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn create(&self, customer: &Customer) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO customers (id, name, email, phone, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, phone, created_at, updated_at FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(row.map(Customer::from))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Customer>, DatabaseError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, phone, created_at, updated_at
             FROM customers WHERE email = $1
             ORDER BY created_at ASC
             LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(row.map(Customer::from))
    }

    async fn update(&self, customer: &Customer) -> Result<Customer, DatabaseError> {
        sqlx::query_as::<_, CustomerRow>(
            "UPDATE customers
             SET name = $2, email = $3, phone = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING id, name, email, phone, created_at, updated_at",
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?
        .map(Customer::from)
        .ok_or_else(|| DatabaseError::not_found("customer", customer.id))
    }

    /// Fails with a foreign key violation while the customer still has payments
    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("customer", id));
        }
        Ok(())
    }
}
