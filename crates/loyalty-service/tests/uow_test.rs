//! 工作单元集成测试
//!
//! 验证提交后回调只在提交成功时执行，回滚时全部丢弃。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test --test uow_test -- --ignored
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::PgPool;

use loyalty::uow::UnitOfWork;
use loyalty_shared::config::{IsolationLevel, UnitOfWorkConfig};

async fn setup() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    PgPool::connect(&url).await.expect("连接数据库失败")
}

fn counting_hook(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
    let counter = counter.clone();
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::future::ready(())
    }
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_after_commit_hooks_run_on_commit() {
    let pool = setup().await;
    let counter = Arc::new(AtomicUsize::new(0));

    let mut uow = UnitOfWork::begin(&pool, &UnitOfWorkConfig::default())
        .await
        .unwrap();
    sqlx::query("SELECT 1").execute(uow.conn()).await.unwrap();
    uow.after_commit(counting_hook(&counter));
    uow.after_commit(counting_hook(&counter));
    assert_eq!(uow.pending_hooks(), 2);
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    uow.commit().await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_after_commit_hooks_dropped_on_rollback() {
    let pool = setup().await;
    let counter = Arc::new(AtomicUsize::new(0));

    let mut uow = UnitOfWork::begin(&pool, &UnitOfWorkConfig::default())
        .await
        .unwrap();
    uow.after_commit(counting_hook(&counter));
    uow.rollback().await.unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_serializable_isolation_and_statement_timeout() {
    let pool = setup().await;
    let config = UnitOfWorkConfig {
        timeout_seconds: 30,
        isolation: IsolationLevel::Serializable,
    };

    let mut uow = UnitOfWork::begin(&pool, &config).await.unwrap();
    assert_eq!(uow.timeout().as_secs(), 30);

    let isolation: String = sqlx::query_scalar("SHOW transaction_isolation")
        .fetch_one(uow.conn())
        .await
        .unwrap();
    assert_eq!(isolation, "serializable");

    let timeout: String = sqlx::query_scalar("SHOW statement_timeout")
        .fetch_one(uow.conn())
        .await
        .unwrap();
    assert_eq!(timeout, "30s");

    uow.rollback().await.unwrap();
}
