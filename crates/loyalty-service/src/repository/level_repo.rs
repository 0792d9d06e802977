//! 会员等级仓储

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::traits::LevelRepositoryTrait;
use crate::error::Result;
use crate::models::{MemberLevel, MemberLevelDefinition};

const DEFINITION_COLUMNS: &str = r#"
    id, brand_id, level_code, name, sort_order, is_default, to_level_times, to_level_days,
    keep_level_times, keep_level_days, bonus_multiple, next_level_code, up_level_gift_id
"#;

/// 会员等级仓储
pub struct LevelRepository {
    pool: PgPool,
}

impl LevelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 事务操作 ====================

    /// 在事务中查询品牌的全部等级定义
    pub async fn list_definitions_in_tx(
        tx: &mut PgConnection,
        brand_id: i64,
    ) -> Result<Vec<MemberLevelDefinition>> {
        let sql = format!(
            "SELECT {} FROM member_level_definitions WHERE brand_id = $1 ORDER BY sort_order, id",
            DEFINITION_COLUMNS
        );
        let rows = sqlx::query_as::<_, MemberLevelDefinition>(&sql)
            .bind(brand_id)
            .fetch_all(tx)
            .await?;

        Ok(rows)
    }

    /// 在事务中获取或创建会员等级（带行级锁）
    ///
    /// 新会员落在默认等级；行锁同时串行化同一会员在同一品牌下的并发签到
    pub async fn get_or_create_member_level_in_tx(
        tx: &mut PgConnection,
        brand_id: i64,
        member_id: i64,
        default_level_code: &str,
    ) -> Result<MemberLevel> {
        sqlx::query(
            r#"
            INSERT INTO member_levels (brand_id, member_id, level_code, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (brand_id, member_id) DO NOTHING
            "#,
        )
        .bind(brand_id)
        .bind(member_id)
        .bind(default_level_code)
        .execute(&mut *tx)
        .await?;

        let level = sqlx::query_as::<_, MemberLevel>(
            r#"
            SELECT id, brand_id, member_id, level_code, back_level_code, level_expire,
                   created_at, updated_at
            FROM member_levels
            WHERE brand_id = $1 AND member_id = $2
            FOR UPDATE
            "#,
        )
        .bind(brand_id)
        .bind(member_id)
        .fetch_one(&mut *tx)
        .await?;

        Ok(level)
    }

    /// 在事务中更新会员等级
    pub async fn update_member_level_in_tx(
        tx: &mut PgConnection,
        id: i64,
        level_code: &str,
        back_level_code: Option<&str>,
        level_expire: Option<DateTime<Utc>>,
    ) -> Result<MemberLevel> {
        let level = sqlx::query_as::<_, MemberLevel>(
            r#"
            UPDATE member_levels
            SET level_code = $2, back_level_code = $3, level_expire = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, brand_id, member_id, level_code, back_level_code, level_expire,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(level_code)
        .bind(back_level_code)
        .bind(level_expire)
        .fetch_one(tx)
        .await?;

        Ok(level)
    }
}

#[async_trait]
impl LevelRepositoryTrait for LevelRepository {
    /// 查询品牌的全部等级定义
    async fn list_definitions(&self, brand_id: i64) -> Result<Vec<MemberLevelDefinition>> {
        let sql = format!(
            "SELECT {} FROM member_level_definitions WHERE brand_id = $1 ORDER BY sort_order, id",
            DEFINITION_COLUMNS
        );
        let rows = sqlx::query_as::<_, MemberLevelDefinition>(&sql)
            .bind(brand_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// 查询会员等级（不存在时不创建）
    async fn find_member_level(
        &self,
        brand_id: i64,
        member_id: i64,
    ) -> Result<Option<MemberLevel>> {
        let level = sqlx::query_as::<_, MemberLevel>(
            r#"
            SELECT id, brand_id, member_id, level_code, back_level_code, level_expire,
                   created_at, updated_at
            FROM member_levels
            WHERE brand_id = $1 AND member_id = $2
            "#,
        )
        .bind(brand_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }
}
