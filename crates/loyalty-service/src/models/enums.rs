//! 积分服务枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 钱包类型
///
/// 每种钱包类型对应一个开户策略，决定记账精度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletType {
    /// 积分
    Points,
}

impl WalletType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Points => "POINTS",
        }
    }
}

/// 钱包持有者类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerType {
    /// 会员
    Member,
    /// 品牌（接收签到佣金）
    Brand,
}

impl OwnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "MEMBER",
            Self::Brand => "BRAND",
        }
    }
}

/// 余额类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceType {
    /// 可消费余额
    #[default]
    Consumable,
}

/// 流水方向
///
/// DEBIT 增加余额，CREDIT 减少余额；balance == total_debit - total_credit。
/// `Ledger::credit_account` 入账落库为 DEBIT，`Ledger::debit_account` 扣账落库为 CREDIT。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// 增加（+）
    Debit,
    /// 减少（-）
    Credit,
}

impl Direction {
    /// 返回该方向的金额符号
    pub fn sign(&self) -> i64 {
        match self {
            Self::Debit => 1,
            Self::Credit => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

/// 签到周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    /// 保级周期 - 关联当前等级定义
    RetentionLevel,
    /// 升级周期 - 关联下一等级定义
    UpLevel,
    /// 打卡活动周期 - 关联打卡活动
    ClockIn,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RetentionLevel => "RETENTION_LEVEL",
            Self::UpLevel => "UP_LEVEL",
            Self::ClockIn => "CLOCK_IN",
        }
    }
}

/// 签到周期状态
///
/// 过期不单独落库，查询时通过 period_expire_at 判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    Running,
    Finish,
}

/// 礼品来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GiftSourceType {
    /// 抽奖中奖
    LuckyDraw,
    /// 打卡活动完成
    ClockIn,
    /// 升级礼
    LevelUp,
}

/// 礼品兑换状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GiftExchangeStatus {
    /// 待领取
    #[default]
    Pending,
    /// 已核销
    Settled,
    /// 已取消
    Cancelled,
}

impl GiftExchangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Settled => "SETTLED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// 只有待领取状态可以流转
    pub fn can_transition_to(&self, target: GiftExchangeStatus) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Settled) | (Self::Pending, Self::Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Debit.sign(), 1);
        assert_eq!(Direction::Credit.sign(), -1);
    }

    #[test]
    fn test_enum_serde_names() {
        assert_eq!(
            serde_json::to_string(&PeriodType::RetentionLevel).unwrap(),
            "\"RETENTION_LEVEL\""
        );
        let wallet: WalletType = serde_json::from_str("\"POINTS\"").unwrap();
        assert_eq!(wallet, WalletType::Points);
        let owner: OwnerType = serde_json::from_str("\"BRAND\"").unwrap();
        assert_eq!(owner, OwnerType::Brand);
    }

    #[test]
    fn test_gift_exchange_transitions() {
        assert!(GiftExchangeStatus::Pending.can_transition_to(GiftExchangeStatus::Settled));
        assert!(GiftExchangeStatus::Pending.can_transition_to(GiftExchangeStatus::Cancelled));
        assert!(!GiftExchangeStatus::Settled.can_transition_to(GiftExchangeStatus::Cancelled));
        assert!(!GiftExchangeStatus::Cancelled.can_transition_to(GiftExchangeStatus::Settled));
        assert!(!GiftExchangeStatus::Pending.can_transition_to(GiftExchangeStatus::Pending));
    }
}
