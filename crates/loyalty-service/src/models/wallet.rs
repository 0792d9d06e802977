//! 钱包账本模型
//!
//! 账户、余额与流水三张表的行结构，以及一次记账的纯计算逻辑。
//! 金额均为按账户 `rounding` 放大后的整数。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::enums::{BalanceType, Direction, OwnerType, WalletType};
use crate::error::{LoyaltyError, Result};

/// 钱包账户
///
/// (wallet_type, owner_type, owner_id) 唯一，rounding 开户后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub id: i64,
    pub wallet_type: WalletType,
    pub owner_type: OwnerType,
    pub owner_id: i64,
    pub rounding: i64,
    pub created_at: DateTime<Utc>,
}

impl WalletAccount {
    /// 换算为展示金额
    pub fn to_display(&self, amount: i64) -> f64 {
        display_amount(amount, self.rounding)
    }
}

/// 钱包余额
///
/// 不变量：balance == total_debit - total_credit 且 balance >= 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub id: i64,
    pub wallet_account_id: i64,
    pub balance_type: BalanceType,
    pub balance: i64,
    pub total_debit: i64,
    pub total_credit: i64,
    pub updated_at: DateTime<Utc>,
}

/// 钱包流水（只追加）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: i64,
    pub wallet_account_id: i64,
    pub balance_type: BalanceType,
    pub direction: Direction,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub subject: String,
    pub remark: Option<String>,
    pub remark_key: Option<String>,
    pub voucher_type: String,
    pub voucher: String,
    pub created_at: DateTime<Utc>,
}

/// 记账明细
///
/// 凭证 (voucher_type, voucher) 指向引起本次变动的业务事件，同一方向只能入账一次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingDetail {
    pub amount: i64,
    pub subject: String,
    pub remark: Option<String>,
    pub remark_key: Option<String>,
    pub voucher_type: String,
    pub voucher: String,
}

impl PostingDetail {
    pub fn new(
        amount: i64,
        subject: impl Into<String>,
        voucher_type: impl Into<String>,
        voucher: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            subject: subject.into(),
            remark: None,
            remark_key: None,
            voucher_type: voucher_type.into(),
            voucher: voucher.into(),
        }
    }

    pub fn with_remark(mut self, remark: impl Into<String>, remark_key: Option<String>) -> Self {
        self.remark = Some(remark.into());
        self.remark_key = remark_key;
        self
    }

    /// 金额必须为正，凭证不能为空
    pub fn validate(&self) -> Result<()> {
        if self.amount <= 0 {
            return Err(LoyaltyError::Validation(format!(
                "记账金额必须大于 0: {}",
                self.amount
            )));
        }
        if self.voucher_type.is_empty() || self.voucher.is_empty() {
            return Err(LoyaltyError::Validation("记账凭证不能为空".to_string()));
        }
        Ok(())
    }
}

/// 一次记账对余额的影响
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub direction: Direction,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
}

impl Posting {
    /// 计算记账后余额，减少后为负则拒绝
    pub fn compute(balance_before: i64, direction: Direction, amount: i64) -> Result<Self> {
        let balance_after = balance_before
            .checked_add(direction.sign() * amount)
            .ok_or_else(|| LoyaltyError::Internal("余额溢出".to_string()))?;

        if balance_after < 0 {
            return Err(LoyaltyError::InsufficientBalance {
                required: amount,
                available: balance_before,
            });
        }

        Ok(Self {
            direction,
            amount,
            balance_before,
            balance_after,
        })
    }

    /// 余额增量（带符号）
    pub fn delta(&self) -> i64 {
        self.balance_after - self.balance_before
    }

    /// (total_debit 增量, total_credit 增量)
    pub fn totals_delta(&self) -> (i64, i64) {
        match self.direction {
            Direction::Debit => (self.amount, 0),
            Direction::Credit => (0, self.amount),
        }
    }
}

/// 余额查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub wallet_type: WalletType,
    pub owner_type: OwnerType,
    pub owner_id: i64,
    /// 放大后的整数金额
    pub balance: i64,
    pub rounding: i64,
    /// 展示金额 = balance / rounding
    pub display_balance: f64,
}

impl BalanceView {
    /// 账户不存在时按零余额返回
    pub fn zero(wallet_type: WalletType, owner_type: OwnerType, owner_id: i64, rounding: i64) -> Self {
        Self {
            wallet_type,
            owner_type,
            owner_id,
            balance: 0,
            rounding,
            display_balance: 0.0,
        }
    }
}

/// 流水分页过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub direction: Option<Direction>,
    pub voucher_type: Option<String>,
}

/// 放大整数换算为展示金额
pub fn display_amount(amount: i64, rounding: i64) -> f64 {
    if rounding <= 0 {
        return amount as f64;
    }
    amount as f64 / rounding as f64
}
