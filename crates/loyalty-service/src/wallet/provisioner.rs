//! 开户策略
//!
//! 每种钱包类型对应一个策略，决定账户的记账精度（rounding）和开户时创建的余额行。

use crate::models::{BalanceType, WalletType};

/// 开户策略 Trait
///
/// rounding 在开户时写入账户并且不再变更，所有金额按 `展示值 * rounding`
/// 的整数存储
pub trait WalletProvisioner: Send + Sync {
    /// 此策略负责的钱包类型
    fn wallet_type(&self) -> WalletType;

    /// 记账精度
    fn rounding(&self) -> i64;

    /// 开户时需要创建的余额行
    fn balance_types(&self) -> &'static [BalanceType] {
        &[BalanceType::Consumable]
    }

    /// 策略描述，用于日志
    fn description(&self) -> &'static str;
}

/// 积分钱包：两位小数精度
#[derive(Debug, Clone, Copy)]
pub struct PointsProvisioner {
    rounding: i64,
}

impl PointsProvisioner {
    pub const DEFAULT_ROUNDING: i64 = 100;

    pub fn new(rounding: i64) -> Self {
        Self { rounding }
    }
}

impl Default for PointsProvisioner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROUNDING)
    }
}

impl WalletProvisioner for PointsProvisioner {
    fn wallet_type(&self) -> WalletType {
        WalletType::Points
    }

    fn rounding(&self) -> i64 {
        self.rounding
    }

    fn description(&self) -> &'static str {
        "积分钱包"
    }
}
