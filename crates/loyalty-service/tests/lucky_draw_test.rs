//! 抽奖服务集成测试
//!
//! 使用真实 PostgreSQL 和 Redis 测试库存扣减、中奖礼品与礼品核销。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... REDIS_URL=redis://... \
//!   cargo test --test lucky_draw_test -- --ignored
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;

use loyalty::error::LoyaltyError;
use loyalty::models::GiftExchangeStatus;
use loyalty::random::SeededRandom;
use loyalty::repository::SettingsRepository;
use loyalty::service::LuckyDrawService;
use loyalty::wallet::{Ledger, ProvisionerRegistry};
use loyalty_shared::cache::Cache;
use loyalty_shared::config::{RedisConfig, UnitOfWorkConfig};
use loyalty_shared::database::Database;

// ==================== 辅助函数 ====================

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

async fn setup() -> (PgPool, LuckyDrawService<SettingsRepository>) {
    let pool = PgPool::connect(&database_url()).await.expect("连接数据库失败");
    Database::from_pool(pool.clone())
        .run_migrations()
        .await
        .expect("执行迁移失败");

    // 免费参与
    sqlx::query(
        r#"
        INSERT INTO global_settings (id, bonus_start, bonus_end, lucky_draw_cost)
        VALUES (1, 100, 500, 0)
        ON CONFLICT (id) DO UPDATE SET lucky_draw_cost = 0
        "#,
    )
    .execute(&pool)
    .await
    .expect("插入全局配置失败");

    let ledger = Arc::new(Ledger::new(
        pool.clone(),
        Arc::new(ProvisionerRegistry::with_defaults()),
    ));
    let cache = Arc::new(
        Cache::new(&RedisConfig {
            url: redis_url(),
            ..Default::default()
        })
        .expect("Redis 客户端创建失败"),
    );

    let service = LuckyDrawService::new(
        pool.clone(),
        ledger,
        Arc::new(SettingsRepository::new(pool.clone())),
        Arc::new(SeededRandom::new(3)),
        cache,
        UnitOfWorkConfig::default(),
    );

    (pool, service)
}

/// 插入进行中的抽奖：一个必中奖项（库存 1）
async fn seed_draw(pool: &PgPool, brand_id: i64) -> (i64, i64) {
    let now = Utc::now();
    let draw_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO lucky_draws (brand_id, name, start_at, end_at, enabled)
        VALUES ($1, '测试抽奖', $2, $3, TRUE)
        RETURNING id
        "#,
    )
    .bind(brand_id)
    .bind(now - Duration::days(1))
    .bind(now + Duration::days(1))
    .fetch_one(pool)
    .await
    .expect("插入抽奖失败");

    let rule_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO lucky_draw_rules
            (lucky_draw_id, level, gift_id, probability, quantity, total_quantity,
             residue_quantity, sort_order)
        VALUES ($1, 1, 900, 1.0, 1, 1, 1, 0)
        RETURNING id
        "#,
    )
    .bind(draw_id)
    .fetch_one(pool)
    .await
    .expect("插入抽奖规则失败");

    (draw_id, rule_id)
}

async fn residue(pool: &PgPool, rule_id: i64) -> i32 {
    sqlx::query_scalar("SELECT residue_quantity FROM lucky_draw_rules WHERE id = $1")
        .bind(rule_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ==================== 测试用例 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_prize_decrements_inventory_and_issues_gift() {
    let (pool, service) = setup().await;
    let id = Utc::now().timestamp_micros();
    let (draw_id, rule_id) = seed_draw(&pool, id).await;

    let first = service.participate(id, draw_id).await.unwrap();
    assert!(first.won);
    assert_eq!(first.record.rule_id, Some(rule_id));
    assert_eq!(first.record.level, 1);
    assert!(first.member_gift_exchange_id.is_some());
    assert_eq!(residue(&pool, rule_id).await, 0);

    // 库存已空，奖项不再参与抽取
    let second = service.participate(id, draw_id).await.unwrap();
    assert!(!second.won);
    assert_eq!(second.record.level, 0);
    assert!(second.member_gift_exchange_id.is_none());
    assert_eq!(residue(&pool, rule_id).await, 0);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_gift_exchange_can_only_be_settled_once() {
    let (pool, service) = setup().await;
    let id = Utc::now().timestamp_micros();
    let (draw_id, _) = seed_draw(&pool, id).await;

    let result = service.participate(id, draw_id).await.unwrap();
    let exchange_id = result.member_gift_exchange_id.unwrap();

    let settled = service.settle_gift_exchange(exchange_id).await.unwrap();
    assert_eq!(settled.status, GiftExchangeStatus::Settled);
    assert!(settled.settled_at.is_some());

    let err = service.cancel_gift_exchange(exchange_id).await.unwrap_err();
    assert!(matches!(
        err,
        LoyaltyError::InvalidGiftExchangeStatus { .. }
    ));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_unknown_draw_and_exchange() {
    let (_, service) = setup().await;

    let err = service.participate(1, i64::MAX).await.unwrap_err();
    assert!(matches!(err, LoyaltyError::LuckyDrawNotFound(_)));

    let err = service.settle_gift_exchange(i64::MAX).await.unwrap_err();
    assert!(matches!(err, LoyaltyError::GiftExchangeNotFound(_)));
}
