use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::AppError;
use crate::models::resource_usage::{UsageCount, UsageEvent};

use super::UsageStore;

pub struct PgUsageStore {
    pool: PgPool,
}

impl PgUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn record(&self, event: &UsageEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO resource_usage (resource_type, resource_id, user_email, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(event.resource_type.as_str())
        .bind(event.resource_id)
        .bind(&event.user_email)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(())
    }

    async fn summary(&self) -> Result<Vec<UsageCount>, AppError> {
        let counts = sqlx::query_as::<_, UsageCount>(
            r#"
            SELECT resource_type, COUNT(*) AS downloads
            FROM resource_usage
            GROUP BY resource_type
            ORDER BY resource_type
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(counts)
    }
}
