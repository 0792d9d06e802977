//! 全局配置仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::SettingsRepositoryTrait;
use crate::error::{LoyaltyError, Result};
use crate::models::GlobalSettings;

/// 全局配置仓储
///
/// 配置表只有 id = 1 一行，缺失视为部署错误
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepositoryTrait for SettingsRepository {
    async fn load_settings(&self) -> Result<GlobalSettings> {
        sqlx::query_as::<_, GlobalSettings>(
            r#"
            SELECT bonus_start, bonus_end, sign_in_interval_minutes, lucky_draw_cost,
                   commission_percent, geofence_enabled, geofence_radius_meters
            FROM global_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LoyaltyError::SettingsNotFound)
    }
}
