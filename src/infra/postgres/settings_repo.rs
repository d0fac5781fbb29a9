use {
    crate::{
        config::{ConfigProvider, GatewayConfig},
        domain::{error::PipelineError, store::StoreFuture},
    },
    sqlx::PgPool,
    std::collections::HashMap,
};

/// Reads `gateway_settings` on every call; there is no cache.
#[derive(Clone)]
pub struct PgSettings {
    pool: PgPool,
}

impl PgSettings {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_inner(&self) -> Result<GatewayConfig, PipelineError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM gateway_settings")
                .fetch_all(&self.pool)
                .await?;
        let settings: HashMap<String, String> = rows.into_iter().collect();
        Ok(GatewayConfig::from_settings(&settings))
    }
}

impl ConfigProvider for PgSettings {
    fn load(&self) -> StoreFuture<'_, GatewayConfig> {
        Box::pin(self.load_inner())
    }
}

pub async fn upsert_setting(pool: &PgPool, key: &str, value: &str) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        INSERT INTO gateway_settings (key, value)
        VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
