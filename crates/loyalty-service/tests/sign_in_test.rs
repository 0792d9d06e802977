//! 签到服务集成测试
//!
//! 使用真实 PostgreSQL 和 Redis 测试签到的完整流程。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... REDIS_URL=redis://... \
//!   cargo test --test sign_in_test -- --ignored
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use loyalty::error::LoyaltyError;
use loyalty::models::{OwnerType, WalletType};
use loyalty::random::SeededRandom;
use loyalty::repository::SettingsRepository;
use loyalty::service::{SignInCommand, SignInService};
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

struct Fixture {
    pool: PgPool,
    ledger: Arc<Ledger>,
    service: Arc<SignInService<SettingsRepository>>,
}

async fn setup() -> Fixture {
    let pool = PgPool::connect(&database_url()).await.expect("连接数据库失败");
    Database::from_pool(pool.clone())
        .run_migrations()
        .await
        .expect("执行迁移失败");

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

    let service = Arc::new(SignInService::new(
        pool.clone(),
        ledger.clone(),
        Arc::new(SettingsRepository::new(pool.clone())),
        Arc::new(SeededRandom::new(42)),
        cache,
        UnitOfWorkConfig::default(),
    ));

    Fixture {
        pool,
        ledger,
        service,
    }
}

/// 全局配置：60 分钟签到间隔，不开启地理围栏，无佣金
async fn seed_settings(pool: &PgPool) {
    sqlx::query(
        r#"
        INSERT INTO global_settings
            (id, bonus_start, bonus_end, sign_in_interval_minutes, lucky_draw_cost,
             commission_percent, geofence_enabled, geofence_radius_meters)
        VALUES (1, 100, 500, 60, 0, 0, FALSE, 500)
        ON CONFLICT (id) DO UPDATE SET
            bonus_start = EXCLUDED.bonus_start,
            bonus_end = EXCLUDED.bonus_end,
            sign_in_interval_minutes = EXCLUDED.sign_in_interval_minutes,
            commission_percent = EXCLUDED.commission_percent,
            geofence_enabled = EXCLUDED.geofence_enabled
        "#,
    )
    .execute(pool)
    .await
    .expect("插入全局配置失败");
}

/// 插入未配置等级的品牌门店，返回 (brand_id, nfc_code)
async fn seed_restaurant(pool: &PgPool, suffix: i64) -> (i64, String) {
    let brand_id = suffix;
    let code = format!("NFC-{suffix}");

    sqlx::query(
        r#"
        INSERT INTO restaurants (brand_id, region_id, name, nfc_code, latitude, longitude, enabled)
        VALUES ($1, 1, '测试门店', $2, 31.2304, 121.4737, TRUE)
        "#,
    )
    .bind(brand_id)
    .bind(&code)
    .execute(pool)
    .await
    .expect("插入门店失败");

    (brand_id, code)
}

fn command(code: &str, member_id: i64, at: DateTime<Utc>) -> SignInCommand {
    SignInCommand {
        code: code.to_string(),
        member_id,
        latitude: Some(31.2304),
        longitude: Some(121.4737),
        sign_in_time: Some(at),
    }
}

async fn count_records(pool: &PgPool, member_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM nfc_sign_in_records WHERE member_id = $1")
        .bind(member_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ==================== 测试用例 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_sign_in_credits_member_wallet() {
    let fx = setup().await;
    seed_settings(&fx.pool).await;
    let suffix = Utc::now().timestamp_micros();
    let (_, code) = seed_restaurant(&fx.pool, suffix).await;
    let member_id = suffix;

    let result = fx
        .service
        .sign_in(command(&code, member_id, Utc::now()))
        .await
        .unwrap();

    assert!((100..=500).contains(&result.record.bonus));
    assert_eq!(result.record.bonus, result.record.original_bonus);
    assert!(!result.level_up);
    assert!(result.current_level.is_none());
    assert!(result.gifts.is_empty());
    assert_eq!(result.balance.balance, result.record.bonus);

    let balance = fx
        .ledger
        .get_balance(WalletType::Points, OwnerType::Member, member_id)
        .await
        .unwrap();
    assert_eq!(balance.balance, result.record.bonus);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_second_sign_in_within_cooldown_is_rejected() {
    let fx = setup().await;
    seed_settings(&fx.pool).await;
    let suffix = Utc::now().timestamp_micros();
    let (_, code) = seed_restaurant(&fx.pool, suffix).await;
    let member_id = suffix;
    let first_at = Utc::now();

    let first = fx
        .service
        .sign_in(command(&code, member_id, first_at))
        .await
        .unwrap();

    let err = fx
        .service
        .sign_in(command(&code, member_id, first_at + Duration::minutes(10)))
        .await
        .unwrap_err();

    match err {
        LoyaltyError::SignInTooFrequent { remaining_seconds } => {
            assert_eq!(remaining_seconds, 50 * 60);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // 被拒绝的签到不产生任何写入
    assert_eq!(count_records(&fx.pool, member_id).await, 1);
    let balance = fx
        .ledger
        .get_balance(WalletType::Points, OwnerType::Member, member_id)
        .await
        .unwrap();
    assert_eq!(balance.balance, first.record.bonus);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_sign_in_after_cooldown_succeeds() {
    let fx = setup().await;
    seed_settings(&fx.pool).await;
    let suffix = Utc::now().timestamp_micros();
    let (_, code) = seed_restaurant(&fx.pool, suffix).await;
    let member_id = suffix;
    let first_at = Utc::now() - Duration::hours(2);

    fx.service
        .sign_in(command(&code, member_id, first_at))
        .await
        .unwrap();
    fx.service
        .sign_in(command(&code, member_id, first_at + Duration::minutes(61)))
        .await
        .unwrap();

    assert_eq!(count_records(&fx.pool, member_id).await, 2);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_unknown_code_is_not_found() {
    let fx = setup().await;
    seed_settings(&fx.pool).await;

    let err = fx
        .service
        .sign_in(command("NFC-DOES-NOT-EXIST", 1, Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::RestaurantNotFound(_)));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_backdated_sign_in_within_cooldown_is_rejected() {
    let fx = setup().await;
    seed_settings(&fx.pool).await;
    let suffix = Utc::now().timestamp_micros();
    let (_, code) = seed_restaurant(&fx.pool, suffix).await;
    let member_id = suffix;
    let now = Utc::now();

    fx.service
        .sign_in(command(&code, member_id, now))
        .await
        .unwrap();

    let err = fx
        .service
        .sign_in(command(&code, member_id, now - Duration::minutes(10)))
        .await
        .unwrap_err();
    match err {
        LoyaltyError::SignInTooFrequent { remaining_seconds } => {
            assert_eq!(remaining_seconds, 50 * 60);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(count_records(&fx.pool, member_id).await, 1);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_concurrent_sign_ins_credit_once() {
    let fx = setup().await;
    seed_settings(&fx.pool).await;
    let suffix = Utc::now().timestamp_micros();
    // 品牌未配置等级，不存在会员等级行锁
    let (_, code) = seed_restaurant(&fx.pool, suffix).await;
    let member_id = suffix;
    let at = Utc::now();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = fx.service.clone();
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            service.sign_in(command(&code, member_id, at)).await
        }));
    }

    let mut successes = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => successes.push(result),
            Err(e) => assert!(matches!(e, LoyaltyError::SignInTooFrequent { .. })),
        }
    }
    assert_eq!(successes.len(), 1);
    assert_eq!(count_records(&fx.pool, member_id).await, 1);

    let balance = fx
        .ledger
        .get_balance(WalletType::Points, OwnerType::Member, member_id)
        .await
        .unwrap();
    assert_eq!(balance.balance, successes[0].record.bonus);
}
