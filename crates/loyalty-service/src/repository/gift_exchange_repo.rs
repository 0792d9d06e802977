//! 会员待领取礼品仓储

use sqlx::PgConnection;

use crate::error::Result;
use crate::models::{GiftExchangeStatus, MemberGiftExchange, NewGiftExchange};

const EXCHANGE_COLUMNS: &str = r#"
    id, member_id, brand_id, gift_id, source_type, source_id, status, settled_at,
    created_at, updated_at
"#;

/// 礼品兑换仓储
pub struct GiftExchangeRepository;

impl GiftExchangeRepository {
    /// 新建待领取礼品（PENDING）
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        exchange: &NewGiftExchange,
    ) -> Result<MemberGiftExchange> {
        let sql = format!(
            r#"
            INSERT INTO member_gift_exchanges
                (member_id, brand_id, gift_id, source_type, source_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {}
            "#,
            EXCHANGE_COLUMNS
        );
        let created = sqlx::query_as::<_, MemberGiftExchange>(&sql)
            .bind(exchange.member_id)
            .bind(exchange.brand_id)
            .bind(exchange.gift_id)
            .bind(exchange.source_type)
            .bind(exchange.source_id)
            .bind(GiftExchangeStatus::Pending)
            .fetch_one(tx)
            .await?;

        Ok(created)
    }

    /// 查询并锁定礼品兑换记录
    pub async fn get_for_update_in_tx(
        tx: &mut PgConnection,
        id: i64,
    ) -> Result<Option<MemberGiftExchange>> {
        let sql = format!(
            "SELECT {} FROM member_gift_exchanges WHERE id = $1 FOR UPDATE",
            EXCHANGE_COLUMNS
        );
        let exchange = sqlx::query_as::<_, MemberGiftExchange>(&sql)
            .bind(id)
            .fetch_optional(tx)
            .await?;

        Ok(exchange)
    }

    /// 更新状态；核销时记录核销时间
    pub async fn update_status_in_tx(
        tx: &mut PgConnection,
        id: i64,
        status: GiftExchangeStatus,
    ) -> Result<MemberGiftExchange> {
        let sql = format!(
            r#"
            UPDATE member_gift_exchanges
            SET status = $2,
                settled_at = CASE WHEN $2::varchar = 'SETTLED' THEN NOW() ELSE settled_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EXCHANGE_COLUMNS
        );
        let updated = sqlx::query_as::<_, MemberGiftExchange>(&sql)
            .bind(id)
            .bind(status)
            .fetch_one(tx)
            .await?;

        Ok(updated)
    }
}
