//! 抽奖仓储

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{LuckyDraw, LuckyDrawRecord, LuckyDrawRule};

/// 新建抽奖记录
#[derive(Debug, Clone)]
pub struct NewLuckyDrawRecord {
    pub lucky_draw_id: i64,
    pub member_id: i64,
    pub rule_id: Option<i64>,
    pub level: i32,
    pub gift_id: Option<i64>,
    pub cost: i64,
    pub participation_no: String,
}

/// 抽奖仓储
pub struct LuckyDrawRepository {
    pool: PgPool,
}

impl LuckyDrawRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 查询抽奖活动
    pub async fn get_lucky_draw(&self, id: i64) -> Result<Option<LuckyDraw>> {
        let draw = sqlx::query_as::<_, LuckyDraw>(
            "SELECT id, brand_id, name, start_at, end_at, enabled FROM lucky_draws WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(draw)
    }

    // ==================== 事务操作 ====================

    /// 品牌在 at 时刻进行中的抽奖活动（取最早创建的一个）
    pub async fn find_active_for_brand_in_tx(
        tx: &mut PgConnection,
        brand_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<LuckyDraw>> {
        let draw = sqlx::query_as::<_, LuckyDraw>(
            r#"
            SELECT id, brand_id, name, start_at, end_at, enabled
            FROM lucky_draws
            WHERE brand_id = $1 AND enabled = TRUE AND start_at <= $2 AND end_at >= $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(brand_id)
        .bind(at)
        .fetch_optional(tx)
        .await?;

        Ok(draw)
    }

    /// 查询抽奖规则，按配置顺序排列
    pub async fn list_rules_in_tx(
        tx: &mut PgConnection,
        lucky_draw_id: i64,
    ) -> Result<Vec<LuckyDrawRule>> {
        let rules = sqlx::query_as::<_, LuckyDrawRule>(
            r#"
            SELECT id, lucky_draw_id, level, gift_id, probability, quantity,
                   total_quantity, residue_quantity, sort_order
            FROM lucky_draw_rules
            WHERE lucky_draw_id = $1
            ORDER BY sort_order, id
            "#,
        )
        .bind(lucky_draw_id)
        .fetch_all(tx)
        .await?;

        Ok(rules)
    }

    /// 扣减奖品库存
    ///
    /// 条件更新保证库存不为负，返回 None 表示库存已被抢完
    pub async fn decrement_residue_in_tx(
        tx: &mut PgConnection,
        rule_id: i64,
        quantity: i32,
    ) -> Result<Option<i32>> {
        let residue: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE lucky_draw_rules
            SET residue_quantity = residue_quantity - $2
            WHERE id = $1 AND residue_quantity >= $2
            RETURNING residue_quantity
            "#,
        )
        .bind(rule_id)
        .bind(quantity)
        .fetch_optional(tx)
        .await?;

        Ok(residue)
    }

    /// 写入抽奖记录
    pub async fn insert_record_in_tx(
        tx: &mut PgConnection,
        record: &NewLuckyDrawRecord,
    ) -> Result<LuckyDrawRecord> {
        let created = sqlx::query_as::<_, LuckyDrawRecord>(
            r#"
            INSERT INTO lucky_draw_records
                (lucky_draw_id, member_id, rule_id, level, gift_id, cost, participation_no, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id, lucky_draw_id, member_id, rule_id, level, gift_id, cost,
                      participation_no, member_gift_exchange_id, created_at
            "#,
        )
        .bind(record.lucky_draw_id)
        .bind(record.member_id)
        .bind(record.rule_id)
        .bind(record.level)
        .bind(record.gift_id)
        .bind(record.cost)
        .bind(&record.participation_no)
        .fetch_one(tx)
        .await?;

        Ok(created)
    }

    /// 关联中奖礼品
    pub async fn attach_exchange_in_tx(
        tx: &mut PgConnection,
        record_id: i64,
        member_gift_exchange_id: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE lucky_draw_records SET member_gift_exchange_id = $2 WHERE id = $1")
            .bind(record_id)
            .bind(member_gift_exchange_id)
            .execute(tx)
            .await?;

        Ok(())
    }
}
