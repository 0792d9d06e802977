//! 等级引擎实现
//!
//! 引擎在一次签到开始时加载品牌的等级阶梯，之后所有等级读写都基于同一份阶梯，
//! 写操作在调用方的工作单元内执行。

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::info;

use crate::error::{LoyaltyError, Result};
use crate::models::{
    GiftSourceType, LevelLadder, MemberGiftExchange, MemberLevel, MemberLevelDefinition,
    NewGiftExchange,
};
use crate::repository::{GiftExchangeRepository, LevelRepository};

/// 会员当前等级
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentLevel {
    /// 会员等级行（已加锁）
    pub member_level: MemberLevel,
    /// 当前生效的等级定义（过期时为回落等级）
    pub definition: MemberLevelDefinition,
}

/// 一次等级变更要写入的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    pub level_code: String,
    pub back_level_code: Option<String>,
    pub level_expire: Option<DateTime<Utc>>,
}

impl LevelChange {
    /// 升级：进入下一级，原生效等级作为回落等级
    pub fn promotion(
        current: &MemberLevelDefinition,
        next: &MemberLevelDefinition,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            level_code: next.level_code.clone(),
            back_level_code: Some(current.level_code.clone()),
            level_expire: next.expire_from(at),
        }
    }

    /// 保级：等级不变，有效期从 at 起重新计算
    pub fn retention(
        level: &MemberLevel,
        current: &MemberLevelDefinition,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            level_code: current.level_code.clone(),
            back_level_code: level.back_level_code.clone(),
            level_expire: current.expire_from(at),
        }
    }
}

/// 升级结果
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub from_level_code: String,
    pub to: MemberLevelDefinition,
    pub gift_exchange: Option<MemberGiftExchange>,
}

/// 等级引擎
#[derive(Debug, Clone)]
pub struct LevelEngine {
    brand_id: i64,
    ladder: LevelLadder,
}

impl LevelEngine {
    pub fn new(brand_id: i64, ladder: LevelLadder) -> Self {
        Self { brand_id, ladder }
    }

    /// 在事务中加载品牌的等级阶梯
    pub async fn load(conn: &mut PgConnection, brand_id: i64) -> Result<Self> {
        let definitions = LevelRepository::list_definitions_in_tx(conn, brand_id).await?;
        Ok(Self::new(brand_id, LevelLadder::new(definitions)))
    }

    /// 品牌是否配置了等级
    pub fn has_levels(&self) -> bool {
        !self.ladder.is_empty()
    }

    pub fn ladder(&self) -> &LevelLadder {
        &self.ladder
    }

    /// 获取会员当前等级，新会员落在默认等级
    ///
    /// 过期等级按 back_level_code 回落，回落只影响读取结果
    pub async fn get_current_level(
        &self,
        conn: &mut PgConnection,
        member_id: i64,
        at: DateTime<Utc>,
    ) -> Result<CurrentLevel> {
        let default = self
            .ladder
            .default_level()
            .ok_or(LoyaltyError::LevelDefinitionNotFound(self.brand_id))?;

        let member_level = LevelRepository::get_or_create_member_level_in_tx(
            conn,
            self.brand_id,
            member_id,
            &default.level_code,
        )
        .await?;

        let definition = self
            .ladder
            .resolve(&member_level, at)
            .cloned()
            .ok_or(LoyaltyError::LevelDefinitionNotFound(self.brand_id))?;

        Ok(CurrentLevel {
            member_level,
            definition,
        })
    }

    /// 下一级，已是顶级时返回 None
    pub fn get_next_level(&self, current: &MemberLevelDefinition) -> Option<&MemberLevelDefinition> {
        self.ladder.next_of(current)
    }

    /// 升级到下一级
    ///
    /// 已是顶级时不做变更并返回 None；目标等级配置了升级礼时生成待领取礼品
    pub async fn promote(
        &self,
        conn: &mut PgConnection,
        member_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Promotion>> {
        let current = self.get_current_level(conn, member_id, at).await?;
        let Some(next) = self.get_next_level(&current.definition).cloned() else {
            return Ok(None);
        };

        let change = LevelChange::promotion(&current.definition, &next, at);
        self.apply(conn, &current.member_level, &change).await?;

        let gift_exchange = match next.up_level_gift_id {
            Some(gift_id) => Some(
                GiftExchangeRepository::create_in_tx(
                    conn,
                    &NewGiftExchange {
                        member_id,
                        brand_id: self.brand_id,
                        gift_id,
                        source_type: GiftSourceType::LevelUp,
                        source_id: current.member_level.id,
                    },
                )
                .await?,
            ),
            None => None,
        };

        info!(
            brand_id = self.brand_id,
            member_id = member_id,
            from = %current.definition.level_code,
            to = %next.level_code,
            level_expire = ?change.level_expire,
            "会员升级"
        );

        Ok(Some(Promotion {
            from_level_code: current.definition.level_code,
            to: next,
            gift_exchange,
        }))
    }

    /// 保级：按当前生效等级的保级天数刷新有效期
    pub async fn retain(
        &self,
        conn: &mut PgConnection,
        member_id: i64,
        at: DateTime<Utc>,
    ) -> Result<MemberLevel> {
        let current = self.get_current_level(conn, member_id, at).await?;
        let change = LevelChange::retention(&current.member_level, &current.definition, at);
        let updated = self.apply(conn, &current.member_level, &change).await?;

        info!(
            brand_id = self.brand_id,
            member_id = member_id,
            level = %change.level_code,
            level_expire = ?change.level_expire,
            "会员保级"
        );

        Ok(updated)
    }

    async fn apply(
        &self,
        conn: &mut PgConnection,
        level: &MemberLevel,
        change: &LevelChange,
    ) -> Result<MemberLevel> {
        LevelRepository::update_member_level_in_tx(
            conn,
            level.id,
            &change.level_code,
            change.back_level_code.as_deref(),
            change.level_expire,
        )
        .await
    }
}
