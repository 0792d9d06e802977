//! 账本
//!
//! 所有余额变动都经过这里。单次记账流程：
//!
//! 1. 校验金额与凭证
//! 2. 锁定余额行（FOR UPDATE），同一账户的记账在此串行
//! 3. 凭证查重，同方向同凭证只能入账一次
//! 4. 计算变动后余额，减少后为负则拒绝
//! 5. 条件更新余额（balance + delta >= 0）并追加流水
//!
//! 写操作都接收事务连接，由调用方的工作单元决定提交或回滚。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument};

use loyalty_shared::observability::metrics;

use super::registry::ProvisionerRegistry;
use crate::error::{LoyaltyError, Result};
use crate::models::{
    BalanceType, BalanceView, Direction, OwnerType, Posting, PostingDetail, TransactionFilter,
    WalletAccount, WalletTransaction, WalletType, display_amount,
};
use crate::repository::WalletRepository;

/// 带展示金额的流水
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: WalletTransaction,
    pub display_amount: f64,
    pub display_balance_after: f64,
}

impl TransactionView {
    pub fn new(transaction: WalletTransaction, rounding: i64) -> Self {
        Self {
            display_amount: display_amount(transaction.amount, rounding),
            display_balance_after: display_amount(transaction.balance_after, rounding),
            transaction,
        }
    }
}

/// 流水分页结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub items: Vec<TransactionView>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// 账本
pub struct Ledger {
    repo: WalletRepository,
    registry: Arc<ProvisionerRegistry>,
}

impl Ledger {
    pub fn new(pool: PgPool, registry: Arc<ProvisionerRegistry>) -> Self {
        Self {
            repo: WalletRepository::new(pool),
            registry,
        }
    }

    // ==================== 写入操作 ====================

    /// 获取账户，不存在时按钱包类型的开户策略开户
    pub async fn get_or_create_account(
        &self,
        conn: &mut PgConnection,
        wallet_type: WalletType,
        owner_type: OwnerType,
        owner_id: i64,
    ) -> Result<WalletAccount> {
        if let Some(account) =
            WalletRepository::find_account_in_tx(conn, wallet_type, owner_type, owner_id).await?
        {
            return Ok(account);
        }

        let provisioner = self.registry.require(wallet_type)?;

        let account = match WalletRepository::insert_account_in_tx(
            conn,
            wallet_type,
            owner_type,
            owner_id,
            provisioner.rounding(),
        )
        .await?
        {
            Some(account) => {
                info!(
                    account_id = account.id,
                    wallet_type = wallet_type.as_str(),
                    owner_type = owner_type.as_str(),
                    owner_id = owner_id,
                    rounding = account.rounding,
                    "钱包账户已开户"
                );
                account
            }
            // 并发开户，对方已提交
            None => WalletRepository::find_account_in_tx(conn, wallet_type, owner_type, owner_id)
                .await?
                .ok_or_else(|| {
                    LoyaltyError::Internal(format!(
                        "开户冲突后未找到账户: {}/{}/{}",
                        wallet_type.as_str(),
                        owner_type.as_str(),
                        owner_id
                    ))
                })?,
        };

        for balance_type in provisioner.balance_types() {
            WalletRepository::ensure_balance_in_tx(conn, account.id, *balance_type).await?;
        }

        Ok(account)
    }

    /// 入账（增加余额），流水方向为 DEBIT
    pub async fn credit_account(
        &self,
        conn: &mut PgConnection,
        account: &WalletAccount,
        detail: &PostingDetail,
    ) -> Result<WalletTransaction> {
        self.post(conn, account, Direction::Debit, detail).await
    }

    /// 扣账（减少余额），流水方向为 CREDIT，余额不足时拒绝
    pub async fn debit_account(
        &self,
        conn: &mut PgConnection,
        account: &WalletAccount,
        detail: &PostingDetail,
    ) -> Result<WalletTransaction> {
        self.post(conn, account, Direction::Credit, detail).await
    }

    /// 转账：先扣 from 再入 to，使用同一凭证
    pub async fn transfer(
        &self,
        conn: &mut PgConnection,
        from: &WalletAccount,
        to: &WalletAccount,
        detail: &PostingDetail,
    ) -> Result<(WalletTransaction, WalletTransaction)> {
        if from.id == to.id {
            return Err(LoyaltyError::Validation("不能向同一账户转账".to_string()));
        }

        let debit = self.debit_account(conn, from, detail).await?;
        let credit = self.credit_account(conn, to, detail).await?;

        Ok((debit, credit))
    }

    #[instrument(
        skip(self, conn, account, detail),
        fields(account_id = account.id, direction = direction.as_str(), voucher = %detail.voucher)
    )]
    async fn post(
        &self,
        conn: &mut PgConnection,
        account: &WalletAccount,
        direction: Direction,
        detail: &PostingDetail,
    ) -> Result<WalletTransaction> {
        // 1. 参数校验
        detail.validate()?;

        // 2. 锁定余额行
        let balance_type = BalanceType::Consumable;
        WalletRepository::ensure_balance_in_tx(conn, account.id, balance_type).await?;
        let balance = WalletRepository::lock_balance_in_tx(conn, account.id, balance_type)
            .await?
            .ok_or_else(|| {
                LoyaltyError::Internal(format!("账户 {} 缺少余额行", account.id))
            })?;

        // 3. 凭证查重
        if WalletRepository::voucher_exists_in_tx(
            conn,
            account.id,
            direction,
            &detail.voucher_type,
            &detail.voucher,
        )
        .await?
        {
            return Err(LoyaltyError::DuplicateVoucher {
                voucher_type: detail.voucher_type.clone(),
                voucher: detail.voucher.clone(),
            });
        }

        // 4. 计算变动
        let posting = Posting::compute(balance.balance, direction, detail.amount)?;

        // 5. 更新余额并追加流水
        WalletRepository::apply_posting_in_tx(conn, balance.id, &posting)
            .await?
            .ok_or(LoyaltyError::InsufficientBalance {
                required: detail.amount,
                available: balance.balance,
            })?;

        let transaction =
            WalletRepository::insert_transaction_in_tx(conn, account.id, balance_type, &posting, detail)
                .await?;

        metrics::record_ledger_posting(
            account.wallet_type.as_str(),
            direction.as_str(),
            &detail.voucher_type,
        );

        debug!(
            transaction_id = transaction.id,
            balance_before = posting.balance_before,
            balance_after = posting.balance_after,
            "记账完成"
        );

        Ok(transaction)
    }

    /// 在事务中读取账户余额（与本事务内的记账结果一致）
    pub async fn balance_of(
        &self,
        conn: &mut PgConnection,
        account: &WalletAccount,
    ) -> Result<BalanceView> {
        let balance = WalletRepository::lock_balance_in_tx(conn, account.id, BalanceType::Consumable)
            .await?
            .map(|b| b.balance)
            .unwrap_or(0);

        Ok(BalanceView {
            wallet_type: account.wallet_type,
            owner_type: account.owner_type,
            owner_id: account.owner_id,
            balance,
            rounding: account.rounding,
            display_balance: account.to_display(balance),
        })
    }

    // ==================== 查询操作 ====================

    /// 查询余额，账户不存在时返回零余额且不开户
    pub async fn get_balance(
        &self,
        wallet_type: WalletType,
        owner_type: OwnerType,
        owner_id: i64,
    ) -> Result<BalanceView> {
        let Some(account) = self.repo.find_account(wallet_type, owner_type, owner_id).await? else {
            let rounding = self.registry.require(wallet_type)?.rounding();
            return Ok(BalanceView::zero(wallet_type, owner_type, owner_id, rounding));
        };

        let balance = self
            .repo
            .find_balance(account.id, BalanceType::Consumable)
            .await?
            .map(|b| b.balance)
            .unwrap_or(0);

        Ok(BalanceView {
            wallet_type,
            owner_type,
            owner_id,
            balance,
            rounding: account.rounding,
            display_balance: account.to_display(balance),
        })
    }

    /// 分页查询流水，最新的在前
    pub async fn page_transactions(
        &self,
        wallet_type: WalletType,
        owner_type: OwnerType,
        owner_id: i64,
        filter: &TransactionFilter,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);

        let Some(account) = self.repo.find_account(wallet_type, owner_type, owner_id).await? else {
            return Ok(TransactionPage {
                items: Vec::new(),
                total: 0,
                page,
                page_size,
            });
        };

        let offset = (page - 1) * page_size;
        let total = self.repo.count_transactions(account.id, filter).await?;
        let items = self
            .repo
            .list_transactions(account.id, filter, page_size, offset)
            .await?
            .into_iter()
            .map(|t| TransactionView::new(t, account.rounding))
            .collect();

        Ok(TransactionPage {
            items,
            total,
            page,
            page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_transaction_view_display_amounts() {
        let transaction = WalletTransaction {
            id: 1,
            wallet_account_id: 1,
            balance_type: BalanceType::Consumable,
            direction: Direction::Credit,
            amount: 200,
            balance_before: 500,
            balance_after: 300,
            subject: "充值扣减".to_string(),
            remark: None,
            remark_key: None,
            voucher_type: "RECHARGE".to_string(),
            voucher: "1".to_string(),
            created_at: Utc::now(),
        };

        let view = TransactionView::new(transaction, 100);
        assert_eq!(view.display_amount, 2.0);
        assert_eq!(view.display_balance_after, 3.0);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["voucherType"], "RECHARGE");
        assert_eq!(json["displayAmount"], 2.0);
    }
}
