//! 工作单元
//!
//! 一次业务操作对应一个 Postgres 事务。账本、周期、等级、抽奖的写操作都通过
//! [`UnitOfWork::conn`] 在同一事务内执行；任一步失败整体回滚。
//!
//! 提交成功后按注册顺序执行 after-commit 回调（通常是缓存失效），
//! 回调只执行一次，不重试。未提交即被丢弃的工作单元由 sqlx 自动回滚。

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;

use loyalty_shared::config::UnitOfWorkConfig;

use crate::error::{LoyaltyError, Result};

type AfterCommitHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// 工作单元
pub struct UnitOfWork {
    tx: Transaction<'static, Postgres>,
    after_commit: Vec<AfterCommitHook>,
    timeout: Duration,
}

impl UnitOfWork {
    /// 开启事务并设置隔离级别与语句超时
    pub async fn begin(pool: &PgPool, config: &UnitOfWorkConfig) -> Result<Self> {
        let mut tx = pool.begin().await?;

        // SET TRANSACTION 必须是事务内第一条语句
        let isolation = format!(
            "SET TRANSACTION ISOLATION LEVEL {}",
            config.isolation.as_sql()
        );
        sqlx::query(&isolation).execute(&mut *tx).await?;

        let statement_timeout = format!(
            "SET LOCAL statement_timeout = {}",
            config.timeout().as_millis()
        );
        sqlx::query(&statement_timeout).execute(&mut *tx).await?;

        Ok(Self {
            tx,
            after_commit: Vec::new(),
            timeout: config.timeout(),
        })
    }

    /// 事务连接，供仓储的 `_in_tx` 函数使用
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// 工作单元的整体超时
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 注册提交成功后执行的回调
    pub fn after_commit<F, Fut>(&mut self, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.after_commit.push(Box::new(move || Box::pin(hook())));
    }

    /// 已注册的回调数量
    pub fn pending_hooks(&self) -> usize {
        self.after_commit.len()
    }

    /// 提交事务，成功后依次执行回调
    pub async fn commit(self) -> Result<()> {
        let Self {
            tx, after_commit, ..
        } = self;

        tx.commit().await?;

        debug!(hooks = after_commit.len(), "Unit of work committed");
        for hook in after_commit {
            hook().await;
        }

        Ok(())
    }

    /// 显式回滚，已注册的回调全部丢弃
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// 在限定时间内执行工作单元内的操作
///
/// 客户端侧超时与数据库的 statement_timeout 互为补充，超时后返回
/// [`LoyaltyError::Timeout`]，调用方丢弃工作单元即回滚
pub async fn with_deadline<T, F>(timeout: Duration, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(LoyaltyError::Timeout(timeout.as_secs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_passes_through_result() {
        let value = with_deadline(Duration::from_secs(1), async { Ok(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);

        let err = with_deadline::<i32, _>(Duration::from_secs(1), async {
            Err(LoyaltyError::SettingsNotFound)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, LoyaltyError::SettingsNotFound));
    }

    #[tokio::test]
    async fn test_with_deadline_times_out() {
        let err = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, LoyaltyError::Timeout(0)));
    }
}
