//! 服务层数据传输对象

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    BalanceView, LuckyDraw, LuckyDrawRecord, MemberGiftExchange, MemberLevelDefinition,
    NfcSignInRecord,
};

/// 签到请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInCommand {
    /// NFC 标签编码
    pub code: String,
    pub member_id: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// 签到时间，缺省为当前时间
    pub sign_in_time: Option<DateTime<Utc>>,
}

/// 等级摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    pub level_code: String,
    pub name: String,
    pub bonus_multiple: f64,
}

impl From<&MemberLevelDefinition> for LevelSummary {
    fn from(definition: &MemberLevelDefinition) -> Self {
        Self {
            level_code: definition.level_code.clone(),
            name: definition.name.clone(),
            bonus_multiple: definition.bonus_multiple,
        }
    }
}

/// 签到结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResult {
    pub record: NfcSignInRecord,
    /// 签到后的当前等级，品牌未配置等级时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_level: Option<LevelSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level: Option<LevelSummary>,
    pub level_up: bool,
    /// 本次签到获得的待领取礼品
    pub gifts: Vec<MemberGiftExchange>,
    /// 进行中的抽奖活动
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lucky_draw: Option<LuckyDraw>,
    /// 距离下一级还需签到次数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign_times_to_next_level: Option<i32>,
    /// 签到后会员积分余额
    pub balance: BalanceView,
}

/// 抽奖结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipateResult {
    pub record: LuckyDrawRecord,
    pub won: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_gift_exchange_id: Option<i64>,
}

/// 会员等级查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLevelDto {
    pub brand_id: i64,
    pub member_id: i64,
    pub level: LevelSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_expire: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_level_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level: Option<LevelSummary>,
}
