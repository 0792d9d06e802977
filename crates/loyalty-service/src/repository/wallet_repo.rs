//! 钱包账本仓储
//!
//! 提供账户、余额、流水的数据访问。写操作全部以 `_in_tx` 形式提供，
//! 由账本在工作单元内调用；余额行在读取前先加行锁。

use sqlx::{PgConnection, PgPool};

use crate::error::{LoyaltyError, Result};
use crate::models::{
    BalanceType, Direction, OwnerType, Posting, PostingDetail, TransactionFilter, WalletAccount,
    WalletBalance, WalletTransaction, WalletType,
};

/// 钱包账本仓储
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 查询账户（不存在时不开户）
    pub async fn find_account(
        &self,
        wallet_type: WalletType,
        owner_type: OwnerType,
        owner_id: i64,
    ) -> Result<Option<WalletAccount>> {
        let account = sqlx::query_as::<_, WalletAccount>(
            r#"
            SELECT id, wallet_type, owner_type, owner_id, rounding, created_at
            FROM wallet_accounts
            WHERE wallet_type = $1 AND owner_type = $2 AND owner_id = $3
            "#,
        )
        .bind(wallet_type)
        .bind(owner_type)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// 查询账户余额
    pub async fn find_balance(
        &self,
        wallet_account_id: i64,
        balance_type: BalanceType,
    ) -> Result<Option<WalletBalance>> {
        let balance = sqlx::query_as::<_, WalletBalance>(
            r#"
            SELECT id, wallet_account_id, balance_type, balance, total_debit, total_credit, updated_at
            FROM wallet_balances
            WHERE wallet_account_id = $1 AND balance_type = $2
            "#,
        )
        .bind(wallet_account_id)
        .bind(balance_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance)
    }

    /// 分页查询流水，按时间倒序
    pub async fn list_transactions(
        &self,
        wallet_account_id: i64,
        filter: &TransactionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WalletTransaction>> {
        let rows = sqlx::query_as::<_, WalletTransaction>(
            r#"
            SELECT id, wallet_account_id, balance_type, direction, amount, balance_before,
                   balance_after, subject, remark, remark_key, voucher_type, voucher, created_at
            FROM wallet_transactions
            WHERE wallet_account_id = $1
              AND ($2::varchar IS NULL OR direction = $2)
              AND ($3::varchar IS NULL OR voucher_type = $3)
            ORDER BY id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(wallet_account_id)
        .bind(filter.direction)
        .bind(filter.voucher_type.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// 统计流水条数
    pub async fn count_transactions(
        &self,
        wallet_account_id: i64,
        filter: &TransactionFilter,
    ) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM wallet_transactions
            WHERE wallet_account_id = $1
              AND ($2::varchar IS NULL OR direction = $2)
              AND ($3::varchar IS NULL OR voucher_type = $3)
            "#,
        )
        .bind(wallet_account_id)
        .bind(filter.direction)
        .bind(filter.voucher_type.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    // ==================== 事务操作 ====================

    /// 在事务中查询账户
    pub async fn find_account_in_tx(
        tx: &mut PgConnection,
        wallet_type: WalletType,
        owner_type: OwnerType,
        owner_id: i64,
    ) -> Result<Option<WalletAccount>> {
        let account = sqlx::query_as::<_, WalletAccount>(
            r#"
            SELECT id, wallet_type, owner_type, owner_id, rounding, created_at
            FROM wallet_accounts
            WHERE wallet_type = $1 AND owner_type = $2 AND owner_id = $3
            "#,
        )
        .bind(wallet_type)
        .bind(owner_type)
        .bind(owner_id)
        .fetch_optional(tx)
        .await?;

        Ok(account)
    }

    /// 在事务中开户
    ///
    /// 并发开户时由唯一约束兜底，冲突方返回 None 后重新查询
    pub async fn insert_account_in_tx(
        tx: &mut PgConnection,
        wallet_type: WalletType,
        owner_type: OwnerType,
        owner_id: i64,
        rounding: i64,
    ) -> Result<Option<WalletAccount>> {
        let account = sqlx::query_as::<_, WalletAccount>(
            r#"
            INSERT INTO wallet_accounts (wallet_type, owner_type, owner_id, rounding, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (wallet_type, owner_type, owner_id) DO NOTHING
            RETURNING id, wallet_type, owner_type, owner_id, rounding, created_at
            "#,
        )
        .bind(wallet_type)
        .bind(owner_type)
        .bind(owner_id)
        .bind(rounding)
        .fetch_optional(tx)
        .await?;

        Ok(account)
    }

    /// 在事务中创建零余额行（已存在则忽略）
    pub async fn ensure_balance_in_tx(
        tx: &mut PgConnection,
        wallet_account_id: i64,
        balance_type: BalanceType,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wallet_balances (wallet_account_id, balance_type, balance, total_debit, total_credit, updated_at)
            VALUES ($1, $2, 0, 0, 0, NOW())
            ON CONFLICT (wallet_account_id, balance_type) DO NOTHING
            "#,
        )
        .bind(wallet_account_id)
        .bind(balance_type)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 在事务中锁定余额行（FOR UPDATE）
    ///
    /// 同一账户的记账在此串行化，锁持有到事务结束
    pub async fn lock_balance_in_tx(
        tx: &mut PgConnection,
        wallet_account_id: i64,
        balance_type: BalanceType,
    ) -> Result<Option<WalletBalance>> {
        let balance = sqlx::query_as::<_, WalletBalance>(
            r#"
            SELECT id, wallet_account_id, balance_type, balance, total_debit, total_credit, updated_at
            FROM wallet_balances
            WHERE wallet_account_id = $1 AND balance_type = $2
            FOR UPDATE
            "#,
        )
        .bind(wallet_account_id)
        .bind(balance_type)
        .fetch_optional(tx)
        .await?;

        Ok(balance)
    }

    /// 在事务中检查凭证是否已入账
    pub async fn voucher_exists_in_tx(
        tx: &mut PgConnection,
        wallet_account_id: i64,
        direction: Direction,
        voucher_type: &str,
        voucher: &str,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM wallet_transactions
                WHERE wallet_account_id = $1 AND direction = $2
                  AND voucher_type = $3 AND voucher = $4
            )
            "#,
        )
        .bind(wallet_account_id)
        .bind(direction)
        .bind(voucher_type)
        .bind(voucher)
        .fetch_one(tx)
        .await?;

        Ok(exists)
    }

    /// 在事务中更新余额
    ///
    /// 使用增量更新并校验更新后余额非负，返回 None 表示余额不足
    pub async fn apply_posting_in_tx(
        tx: &mut PgConnection,
        balance_id: i64,
        posting: &Posting,
    ) -> Result<Option<i64>> {
        let (debit_delta, credit_delta) = posting.totals_delta();

        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE wallet_balances
            SET balance = balance + $2,
                total_debit = total_debit + $3,
                total_credit = total_credit + $4,
                updated_at = NOW()
            WHERE id = $1 AND balance + $2 >= 0
            RETURNING balance
            "#,
        )
        .bind(balance_id)
        .bind(posting.delta())
        .bind(debit_delta)
        .bind(credit_delta)
        .fetch_optional(tx)
        .await?;

        Ok(balance)
    }

    /// 在事务中追加流水
    ///
    /// 凭证唯一约束冲突转换为 DuplicateVoucher
    pub async fn insert_transaction_in_tx(
        tx: &mut PgConnection,
        wallet_account_id: i64,
        balance_type: BalanceType,
        posting: &Posting,
        detail: &PostingDetail,
    ) -> Result<WalletTransaction> {
        let result = sqlx::query_as::<_, WalletTransaction>(
            r#"
            INSERT INTO wallet_transactions
                (wallet_account_id, balance_type, direction, amount, balance_before, balance_after,
                 subject, remark, remark_key, voucher_type, voucher, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
            RETURNING id, wallet_account_id, balance_type, direction, amount, balance_before,
                      balance_after, subject, remark, remark_key, voucher_type, voucher, created_at
            "#,
        )
        .bind(wallet_account_id)
        .bind(balance_type)
        .bind(posting.direction)
        .bind(posting.amount)
        .bind(posting.balance_before)
        .bind(posting.balance_after)
        .bind(&detail.subject)
        .bind(&detail.remark)
        .bind(&detail.remark_key)
        .bind(&detail.voucher_type)
        .bind(&detail.voucher)
        .fetch_one(tx)
        .await;

        match result {
            Ok(transaction) => Ok(transaction),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(LoyaltyError::DuplicateVoucher {
                    voucher_type: detail.voucher_type.clone(),
                    voucher: detail.voucher.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
