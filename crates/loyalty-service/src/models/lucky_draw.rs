//! 抽奖与礼品兑换模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::enums::{GiftExchangeStatus, GiftSourceType};

/// 抽奖活动
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LuckyDraw {
    pub id: i64,
    pub brand_id: i64,
    pub name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub enabled: bool,
}

impl LuckyDraw {
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.enabled && self.start_at <= at && at <= self.end_at
    }
}

/// 抽奖规则（奖项）
///
/// level 为 0 表示"未中奖"兜底项，不占库存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LuckyDrawRule {
    pub id: i64,
    pub lucky_draw_id: i64,
    pub level: i32,
    pub gift_id: Option<i64>,
    pub probability: f64,
    /// 单次中奖扣减的库存数
    pub quantity: i32,
    pub total_quantity: i32,
    pub residue_quantity: i32,
    pub sort_order: i32,
}

impl LuckyDrawRule {
    pub fn is_blank(&self) -> bool {
        self.level == 0
    }

    /// 可参与抽取：兜底项总是可抽，其余需要剩余库存够扣一次
    ///
    /// 与库存扣减的条件 residue_quantity >= quantity 保持一致
    pub fn is_eligible(&self) -> bool {
        self.is_blank() || self.residue_quantity >= self.quantity.max(1)
    }
}

/// 抽奖记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LuckyDrawRecord {
    pub id: i64,
    pub lucky_draw_id: i64,
    pub member_id: i64,
    pub rule_id: Option<i64>,
    pub level: i32,
    pub gift_id: Option<i64>,
    pub cost: i64,
    pub participation_no: String,
    pub member_gift_exchange_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 会员待领取礼品
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberGiftExchange {
    pub id: i64,
    pub member_id: i64,
    pub brand_id: i64,
    pub gift_id: i64,
    pub source_type: GiftSourceType,
    pub source_id: i64,
    pub status: GiftExchangeStatus,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建待领取礼品
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGiftExchange {
    pub member_id: i64,
    pub brand_id: i64,
    pub gift_id: i64,
    pub source_type: GiftSourceType,
    pub source_id: i64,
}
