use crate::database::error::DatabaseError;
use crate::payments::repository::MerchantRepository;
use crate::payments::types::Merchant;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct MerchantRow {
    id: Uuid,
    name: String,
    email: String,
    api_key: String,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<MerchantRow> for Merchant {
    fn from(row: MerchantRow) -> Self {
        Merchant {
            id: row.id,
            name: row.name,
            email: row.email,
            api_key: row.api_key,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres-backed merchant storage
pub struct PgMerchantRepository {
    pool: PgPool,
}

impl PgMerchantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MerchantRepository for PgMerchantRepository {
    async fn create(&self, merchant: &Merchant) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO merchants (id, name, email, api_key, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(merchant.id)
        .bind(&merchant.name)
        .bind(&merchant.email)
        .bind(&merchant.api_key)
        .bind(merchant.is_active)
        .bind(merchant.created_at)
        .bind(merchant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Merchant>, DatabaseError> {
        let row = sqlx::query_as::<_, MerchantRow>(
            "SELECT id, name, email, api_key, is_active, created_at, updated_at
             FROM merchants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(row.map(Merchant::from))
    }

    async fn get_by_api_key(&self, api_key: &str) -> Result<Option<Merchant>, DatabaseError> {
        let row = sqlx::query_as::<_, MerchantRow>(
            "SELECT id, name, email, api_key, is_active, created_at, updated_at
             FROM merchants WHERE api_key = $1",
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(row.map(Merchant::from))
    }

    async fn update(&self, merchant: &Merchant) -> Result<Merchant, DatabaseError> {
        sqlx::query_as::<_, MerchantRow>(
            "UPDATE merchants
             SET name = $2, email = $3, api_key = $4, is_active = $5, updated_at = NOW()
             WHERE id = $1
             RETURNING id, name, email, api_key, is_active, created_at, updated_at",
        )
        .bind(merchant.id)
        .bind(&merchant.name)
        .bind(&merchant.email)
        .bind(&merchant.api_key)
        .bind(merchant.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?
        .map(Merchant::from)
        .ok_or_else(|| DatabaseError::not_found("merchant", merchant.id))
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE merchants SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("merchant", id));
        }
        Ok(())
    }
}
