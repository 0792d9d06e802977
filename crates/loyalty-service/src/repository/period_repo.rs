//! 签到周期仓储
//!
//! 周期过期不落库：查找运行中周期时以 period_expire_at >= 签到时间为条件，
//! 过期的周期被自然放弃，下一次签到会新建周期。

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::error::Result;
use crate::models::{NfcSignInPeriod, PeriodType};
use crate::period::PeriodWindow;

const PERIOD_COLUMNS: &str = r#"
    id, period_type, relate_id, member_id, brand_id, status, sign_in_times, cycle_base_times,
    period_start_at, period_end_at, period_expire_at, created_at, updated_at
"#;

/// 新建周期参数
#[derive(Debug, Clone)]
pub struct NewPeriod {
    pub period_type: PeriodType,
    pub relate_id: i64,
    pub member_id: i64,
    pub brand_id: i64,
    pub window: PeriodWindow,
}

/// 签到周期仓储
///
/// 周期只在签到工作单元内读写，因此只提供事务操作
pub struct PeriodRepository;

impl PeriodRepository {
    /// 查找运行中且未过期的周期（带行级锁），最近创建的优先
    pub async fn find_running_for_update(
        tx: &mut PgConnection,
        period_type: PeriodType,
        member_id: i64,
        relate_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<NfcSignInPeriod>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM nfc_sign_in_periods
            WHERE period_type = $1 AND member_id = $2 AND relate_id = $3
              AND status = 'RUNNING' AND period_expire_at >= $4
            ORDER BY id DESC
            LIMIT 1
            FOR UPDATE
            "#,
            PERIOD_COLUMNS
        );
        let period = sqlx::query_as::<_, NfcSignInPeriod>(&sql)
            .bind(period_type)
            .bind(member_id)
            .bind(relate_id)
            .bind(at)
            .fetch_optional(tx)
            .await?;

        Ok(period)
    }

    /// 是否存在已完成的周期（不循环的打卡活动每人只完成一次）
    pub async fn has_finished(
        tx: &mut PgConnection,
        period_type: PeriodType,
        member_id: i64,
        relate_id: i64,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM nfc_sign_in_periods
                WHERE period_type = $1 AND member_id = $2 AND relate_id = $3 AND status = 'FINISH'
            )
            "#,
        )
        .bind(period_type)
        .bind(member_id)
        .bind(relate_id)
        .fetch_one(tx)
        .await?;

        Ok(exists)
    }

    /// 新建周期，首次签到即计一次
    pub async fn create_in_tx(tx: &mut PgConnection, period: &NewPeriod) -> Result<NfcSignInPeriod> {
        let sql = format!(
            r#"
            INSERT INTO nfc_sign_in_periods
                (period_type, relate_id, member_id, brand_id, status, sign_in_times, cycle_base_times,
                 period_start_at, period_end_at, period_expire_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'RUNNING', 1, 0, $5, $6, $7, NOW(), NOW())
            RETURNING {}
            "#,
            PERIOD_COLUMNS
        );
        let created = sqlx::query_as::<_, NfcSignInPeriod>(&sql)
            .bind(period.period_type)
            .bind(period.relate_id)
            .bind(period.member_id)
            .bind(period.brand_id)
            .bind(period.window.start_at)
            .bind(period.window.end_at)
            .bind(period.window.expire_at)
            .fetch_one(tx)
            .await?;

        Ok(created)
    }

    /// 关联周期与签到记录
    ///
    /// 返回 false 表示该签到已经计入过此周期
    pub async fn link_record_in_tx(
        tx: &mut PgConnection,
        period_id: i64,
        sign_in_record_id: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO nfc_sign_in_period_relations (period_id, sign_in_record_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (period_id, sign_in_record_id) DO NOTHING
            "#,
        )
        .bind(period_id)
        .bind(sign_in_record_id)
        .execute(tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 签到次数加一，仅对运行中的周期生效
    pub async fn increment_in_tx(tx: &mut PgConnection, period_id: i64) -> Result<Option<i32>> {
        let times: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE nfc_sign_in_periods
            SET sign_in_times = sign_in_times + 1, updated_at = NOW()
            WHERE id = $1 AND status = 'RUNNING'
            RETURNING sign_in_times
            "#,
        )
        .bind(period_id)
        .fetch_optional(tx)
        .await?;

        Ok(times)
    }

    /// 结束周期
    pub async fn finish_in_tx(tx: &mut PgConnection, period_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE nfc_sign_in_periods
            SET status = 'FINISH', updated_at = NOW()
            WHERE id = $1 AND status = 'RUNNING'
            "#,
        )
        .bind(period_id)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 原地续期：从 base_times 开始重新计数，窗口整体前移
    pub async fn renew_in_tx(
        tx: &mut PgConnection,
        period_id: i64,
        base_times: i32,
        window: &PeriodWindow,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE nfc_sign_in_periods
            SET cycle_base_times = $2, period_start_at = $3, period_end_at = $4,
                period_expire_at = $5, updated_at = NOW()
            WHERE id = $1 AND status = 'RUNNING'
            "#,
        )
        .bind(period_id)
        .bind(base_times)
        .bind(window.start_at)
        .bind(window.end_at)
        .bind(window.expire_at)
        .execute(tx)
        .await?;

        Ok(())
    }
}
