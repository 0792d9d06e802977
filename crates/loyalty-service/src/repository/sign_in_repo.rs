//! 门店与签到记录仓储

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::error::Result;
use crate::models::{ClockInCampaign, NewSignInRecord, NfcSignInRecord, Restaurant};

/// 签到仓储
pub struct SignInRepository;

impl SignInRepository {
    /// 按 NFC 标签编码查找门店
    pub async fn find_restaurant_by_code(
        tx: &mut PgConnection,
        nfc_code: &str,
    ) -> Result<Option<Restaurant>> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            r#"
            SELECT id, brand_id, region_id, name, nfc_code, latitude, longitude, enabled
            FROM restaurants
            WHERE nfc_code = $1
            "#,
        )
        .bind(nfc_code)
        .fetch_optional(tx)
        .await?;

        Ok(restaurant)
    }

    /// 在事务内串行化同一会员的签到
    ///
    /// 事务级 advisory lock，提交或回滚时自动释放
    pub async fn lock_member_in_tx(tx: &mut PgConnection, member_id: i64) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended('nfc_sign_in:member:' || $1::text, 0))")
            .bind(member_id)
            .execute(tx)
            .await?;

        Ok(())
    }

    /// 会员在该门店距 at 最近的一次签到时间（前后两侧都算）
    ///
    /// 签到时间由客户端提供，只看更早的记录会被回填时间绕过
    pub async fn nearest_sign_in_at(
        tx: &mut PgConnection,
        member_id: i64,
        restaurant_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        let nearest: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            SELECT t.sign_in_at
            FROM (
                (SELECT sign_in_at FROM nfc_sign_in_records
                 WHERE member_id = $1 AND restaurant_id = $2 AND sign_in_at <= $3
                 ORDER BY sign_in_at DESC LIMIT 1)
                UNION ALL
                (SELECT sign_in_at FROM nfc_sign_in_records
                 WHERE member_id = $1 AND restaurant_id = $2 AND sign_in_at > $3
                 ORDER BY sign_in_at ASC LIMIT 1)
            ) t
            ORDER BY ABS(EXTRACT(EPOCH FROM (t.sign_in_at - $3::timestamptz)))
            LIMIT 1
            "#,
        )
        .bind(member_id)
        .bind(restaurant_id)
        .bind(at)
        .fetch_optional(tx)
        .await?;

        Ok(nearest)
    }

    /// 写入签到记录
    pub async fn insert_record_in_tx(
        tx: &mut PgConnection,
        record: &NewSignInRecord,
    ) -> Result<NfcSignInRecord> {
        let created = sqlx::query_as::<_, NfcSignInRecord>(
            r#"
            INSERT INTO nfc_sign_in_records
                (member_id, brand_id, restaurant_id, region_id, sign_in_at, bonus, original_bonus,
                 level_code, bonus_multiple, clock_in_campaign_id, latitude, longitude, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            RETURNING id, member_id, brand_id, restaurant_id, region_id, sign_in_at, bonus,
                      original_bonus, level_code, bonus_multiple, clock_in_campaign_id,
                      latitude, longitude, created_at
            "#,
        )
        .bind(record.member_id)
        .bind(record.brand_id)
        .bind(record.restaurant_id)
        .bind(record.region_id)
        .bind(record.sign_in_at)
        .bind(record.bonus)
        .bind(record.original_bonus)
        .bind(&record.level_code)
        .bind(record.bonus_multiple)
        .bind(record.clock_in_campaign_id)
        .bind(record.latitude)
        .bind(record.longitude)
        .fetch_one(tx)
        .await?;

        Ok(created)
    }

    /// 品牌在 at 时刻进行中的打卡活动
    pub async fn list_active_campaigns(
        tx: &mut PgConnection,
        brand_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Vec<ClockInCampaign>> {
        let campaigns = sqlx::query_as::<_, ClockInCampaign>(
            r#"
            SELECT id, brand_id, name, start_at, end_at, cycle_days_length, clock_in_times,
                   loop_enabled, gift_id, enabled
            FROM clock_in_campaigns
            WHERE brand_id = $1 AND enabled = TRUE AND start_at <= $2 AND end_at >= $2
            ORDER BY id
            "#,
        )
        .bind(brand_id)
        .bind(at)
        .fetch_all(tx)
        .await?;

        Ok(campaigns)
    }
}
