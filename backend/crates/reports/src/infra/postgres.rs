//! PostgreSQL Game Directory

use kernel::id::OrganizationId;
use sqlx::PgPool;

use crate::domain::repository::GameDirectory;
use crate::error::ReportResult;

#[derive(Clone)]
pub struct PgGameDirectory {
    pool: PgPool,
}

impl PgGameDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl GameDirectory for PgGameDirectory {
    async fn provider_games(&self, provider: OrganizationId) -> ReportResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM games WHERE organization_id = $1 AND deleted_at IS NULL ORDER BY name",
        )
        .bind(provider)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}
