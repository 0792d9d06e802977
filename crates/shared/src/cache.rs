//! Redis 缓存管理模块
//!
//! 余额、会员等级等读多写少数据的缓存封装。写路径在事务提交后失效对应键，
//! 缓存只作为读加速，任何缓存故障都不影响账本正确性。

use crate::config::RedisConfig;
use crate::error::{Result, SharedError};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{info, instrument};

/// Redis 缓存客户端
#[derive(Clone)]
pub struct Cache {
    client: Client,
    default_ttl: Duration,
}

impl Cache {
    /// 创建 Redis 客户端
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        info!("Redis client created");
        Ok(Self {
            client,
            default_ttl: Duration::from_secs(config.default_ttl_seconds),
        })
    }

    /// 默认过期时间
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    async fn get_conn(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(SharedError::from)
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(SharedError::from)
    }

    /// 获取值
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(v) => {
                let parsed: T = serde_json::from_str(&v)
                    .map_err(|e| SharedError::CacheSerialization(e.to_string()))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// 设置值
    #[instrument(skip(self, value))]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let serialized = serde_json::to_string(value)
            .map_err(|e| SharedError::CacheSerialization(e.to_string()))?;

        let _: () = conn.set_ex(key, serialized, ttl.as_secs()).await?;
        Ok(())
    }

    /// 批量删除
    #[instrument(skip(self))]
    pub async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get_conn().await?;
        let count: u64 = conn.del(keys).await?;
        Ok(count)
    }

    /// 删除值
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

/// 缓存键生成器
pub struct CacheKey;

impl CacheKey {
    /// 钱包余额：wallet:balance:{wallet_type}:{owner_type}:{owner_id}
    pub fn wallet_balance(wallet_type: &str, owner_type: &str, owner_id: i64) -> String {
        format!("wallet:balance:{}:{}:{}", wallet_type, owner_type, owner_id)
    }

    /// 会员在品牌下的等级
    pub fn member_level(brand_id: i64, member_id: i64) -> String {
        format!("member:level:{}:{}", brand_id, member_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_generation() {
        assert_eq!(
            CacheKey::wallet_balance("POINTS", "MEMBER", 42),
            "wallet:balance:POINTS:MEMBER:42"
        );
        assert_eq!(CacheKey::member_level(3, 7), "member:level:3:7");
    }
}
