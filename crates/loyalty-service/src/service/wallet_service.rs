//! 钱包查询服务
//!
//! 余额与会员等级的只读查询，采用缓存优先策略。
//! 写路径（签到、抽奖）在事务提交后失效对应缓存键。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{instrument, warn};

use loyalty_shared::cache::{Cache, CacheKey};

use crate::error::{LoyaltyError, Result};
use crate::models::{
    BalanceView, LevelLadder, MemberLevel, OwnerType, TransactionFilter, WalletType,
};
use crate::repository::LevelRepositoryTrait;
use crate::service::dto::{LevelSummary, MemberLevelDto};
use crate::wallet::{Ledger, TransactionPage};

/// 钱包查询服务
pub struct WalletService<LR>
where
    LR: LevelRepositoryTrait,
{
    ledger: Arc<Ledger>,
    level_repo: Arc<LR>,
    cache: Arc<Cache>,
}

impl<LR> WalletService<LR>
where
    LR: LevelRepositoryTrait,
{
    pub fn new(ledger: Arc<Ledger>, level_repo: Arc<LR>, cache: Arc<Cache>) -> Self {
        Self {
            ledger,
            level_repo,
            cache,
        }
    }

    async fn get_cached_or_fetch<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.cache.get::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Cache get failed, falling back to database");
            }
        }

        let data = fetch().await?;

        if let Err(e) = self.cache.set(key, &data, ttl).await {
            warn!(key = %key, error = %e, "Cache set failed");
        }

        Ok(data)
    }

    /// 查询余额
    ///
    /// 缓存键: wallet:balance:{wallet_type}:{owner_type}:{owner_id}
    #[instrument(skip(self))]
    pub async fn get_balance(
        &self,
        wallet_type: WalletType,
        owner_type: OwnerType,
        owner_id: i64,
    ) -> Result<BalanceView> {
        let key = CacheKey::wallet_balance(wallet_type.as_str(), owner_type.as_str(), owner_id);

        self.get_cached_or_fetch(&key, self.cache.default_ttl(), || async {
            self.ledger
                .get_balance(wallet_type, owner_type, owner_id)
                .await
        })
        .await
    }

    /// 分页查询流水（不缓存）
    #[instrument(skip(self, filter))]
    pub async fn page_transactions(
        &self,
        wallet_type: WalletType,
        owner_type: OwnerType,
        owner_id: i64,
        filter: &TransactionFilter,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage> {
        self.ledger
            .page_transactions(wallet_type, owner_type, owner_id, filter, page, page_size)
            .await
    }

    /// 查询会员在品牌下的当前等级
    ///
    /// 只读：会员尚无等级记录时按默认等级返回，不写库。
    /// 缓存键: member:level:{brand_id}:{member_id}
    #[instrument(skip(self))]
    pub async fn get_member_level(&self, brand_id: i64, member_id: i64) -> Result<MemberLevelDto> {
        let key = CacheKey::member_level(brand_id, member_id);

        self.get_cached_or_fetch(&key, self.cache.default_ttl(), || async {
            let ladder = LevelLadder::new(self.level_repo.list_definitions(brand_id).await?);
            let level = self.level_repo.find_member_level(brand_id, member_id).await?;
            build_member_level(&ladder, level.as_ref(), brand_id, member_id, Utc::now())
        })
        .await
    }
}

/// 由等级阶梯和会员等级行组装查询结果
fn build_member_level(
    ladder: &LevelLadder,
    level: Option<&MemberLevel>,
    brand_id: i64,
    member_id: i64,
    at: DateTime<Utc>,
) -> Result<MemberLevelDto> {
    let default = ladder
        .default_level()
        .ok_or(LoyaltyError::LevelDefinitionNotFound(brand_id))?;

    let (current, level_expire, back_level_code) = match level {
        Some(level) => {
            let current = ladder.resolve(level, at).unwrap_or(default);
            // 已过期的等级不再展示过期时间
            let expire = if level.is_expired(at) {
                None
            } else {
                level.level_expire
            };
            (current, expire, level.back_level_code.clone())
        }
        None => (default, None, None),
    };

    Ok(MemberLevelDto {
        brand_id,
        member_id,
        level: LevelSummary::from(current),
        level_expire,
        back_level_code,
        next_level: ladder.next_of(current).map(LevelSummary::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::level_fixtures::{ladder, member_level};
    use chrono::Duration;

    #[test]
    fn test_new_member_reads_default_level() {
        let dto = build_member_level(&ladder(), None, 1, 100, Utc::now()).unwrap();
        assert_eq!(dto.level.level_code, "BRONZE");
        assert_eq!(dto.next_level.unwrap().level_code, "SILVER");
        assert!(dto.level_expire.is_none());
    }

    #[test]
    fn test_expired_level_reads_back_level() {
        let now = Utc::now();
        let level = member_level("GOLD", Some("SILVER"), Some(now - Duration::days(1)));

        let dto = build_member_level(&ladder(), Some(&level), 1, 100, now).unwrap();
        assert_eq!(dto.level.level_code, "SILVER");
        assert!(dto.level_expire.is_none());
        assert_eq!(dto.next_level.unwrap().level_code, "GOLD");
    }

    #[test]
    fn test_top_level_has_no_next() {
        let now = Utc::now();
        let expire = now + Duration::days(10);
        let level = member_level("GOLD", Some("SILVER"), Some(expire));

        let dto = build_member_level(&ladder(), Some(&level), 1, 100, now).unwrap();
        assert_eq!(dto.level.level_code, "GOLD");
        assert_eq!(dto.level_expire, Some(expire));
        assert!(dto.next_level.is_none());
    }

    #[test]
    fn test_brand_without_levels() {
        let err = build_member_level(&LevelLadder::default(), None, 9, 100, Utc::now()).unwrap_err();
        assert!(matches!(err, LoyaltyError::LevelDefinitionNotFound(9)));
    }
}
