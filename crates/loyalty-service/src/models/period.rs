//! 签到周期与打卡活动模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::enums::{PeriodStatus, PeriodType};

/// 签到累计周期
///
/// 进度 = sign_in_times - cycle_base_times，保级成功后窗口原地续期，
/// cycle_base_times 记录续期时的累计次数，sign_in_times 本身只增不减
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NfcSignInPeriod {
    pub id: i64,
    pub period_type: PeriodType,
    /// 保级/升级为等级定义 ID，打卡为活动 ID
    pub relate_id: i64,
    pub member_id: i64,
    pub brand_id: i64,
    pub status: PeriodStatus,
    pub sign_in_times: i32,
    pub cycle_base_times: i32,
    pub period_start_at: DateTime<Utc>,
    pub period_end_at: DateTime<Utc>,
    pub period_expire_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NfcSignInPeriod {
    /// 当前周期内的签到进度
    pub fn progress(&self) -> i32 {
        self.sign_in_times - self.cycle_base_times
    }
}

/// 打卡活动
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClockInCampaign {
    pub id: i64,
    pub brand_id: i64,
    pub name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// 一个打卡周期的天数
    pub cycle_days_length: i32,
    /// 周期内需要打卡的次数
    pub clock_in_times: i32,
    /// 完成后是否可以开始下一轮
    pub loop_enabled: bool,
    pub gift_id: Option<i64>,
    pub enabled: bool,
}

impl ClockInCampaign {
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.enabled && self.start_at <= at && at <= self.end_at
    }
}
