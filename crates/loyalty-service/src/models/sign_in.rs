//! NFC 签到相关模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 门店（NFC 标签所在位置）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    pub brand_id: i64,
    pub region_id: i64,
    pub name: String,
    pub nfc_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub enabled: bool,
}

/// 全局配置（单行）
///
/// 积分相关金额均为放大后的整数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub bonus_start: i64,
    pub bonus_end: i64,
    pub sign_in_interval_minutes: i32,
    pub lucky_draw_cost: i64,
    pub commission_percent: i32,
    pub geofence_enabled: bool,
    pub geofence_radius_meters: f64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            bonus_start: 100,
            bonus_end: 500,
            sign_in_interval_minutes: 60,
            lucky_draw_cost: 0,
            commission_percent: 0,
            geofence_enabled: false,
            geofence_radius_meters: 500.0,
        }
    }
}

/// 签到记录
///
/// 等级编码和倍率冗余保存签到当时的值，便于审计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NfcSignInRecord {
    pub id: i64,
    pub member_id: i64,
    pub brand_id: i64,
    pub restaurant_id: i64,
    pub region_id: i64,
    pub sign_in_at: DateTime<Utc>,
    pub bonus: i64,
    pub original_bonus: i64,
    pub level_code: Option<String>,
    pub bonus_multiple: f64,
    pub clock_in_campaign_id: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// 新建签到记录
#[derive(Debug, Clone, PartialEq)]
pub struct NewSignInRecord {
    pub member_id: i64,
    pub brand_id: i64,
    pub restaurant_id: i64,
    pub region_id: i64,
    pub sign_in_at: DateTime<Utc>,
    pub bonus: i64,
    pub original_bonus: i64,
    pub level_code: Option<String>,
    pub bonus_multiple: f64,
    pub clock_in_campaign_id: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
