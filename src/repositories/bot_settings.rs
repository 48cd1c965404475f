use std::collections::HashMap;

use sqlx::PgPool;

use crate::models::bot_settings::{RewardConfig, Setting};

#[derive(Clone)]
pub struct SettingsRepository {
    conn: PgPool,
}

impl SettingsRepository {
    pub fn new(conn: PgPool) -> Self {
        SettingsRepository { conn }
    }

    pub async fn get_settings(&self) -> Result<HashMap<String, String>, anyhow::Error> {
        let rows = sqlx::query_as::<_, Setting>("SELECT key, value FROM bot_settings")
            .fetch_all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|s| (s.key, s.value)).collect())
    }

    pub async fn update_settings(
        &self,
        values: &HashMap<String, String>,
    ) -> Result<(), anyhow::Error> {
        for (key, value) in values {
            sqlx::query(
                r#"
                    INSERT INTO bot_settings (key, value)
                    VALUES ($1, $2)
                    ON CONFLICT (key) DO UPDATE
                    SET value = EXCLUDED.value, updated_at = CURRENT_TIMESTAMP
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&self.conn)
            .await?;
        }

        Ok(())
    }

    /// Snapshot of the reward magnitudes for one ledger operation. Reads the
    /// whole table and parses it once; defaults cover missing rows.
    pub async fn reward_config(&self) -> Result<RewardConfig, anyhow::Error> {
        let values = self.get_settings().await?;

        Ok(RewardConfig::from_map(&values))
    }
}
