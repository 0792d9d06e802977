//! 会员等级模型
//!
//! 等级定义按品牌配置，通过 `next_level_code` 串成一条升级链。
//! 会员等级过期后回落到 `back_level_code`，回落只在读取时计算，直到下一次保级或升级才写库。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 会员等级定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberLevelDefinition {
    pub id: i64,
    pub brand_id: i64,
    pub level_code: String,
    pub name: String,
    pub sort_order: i32,
    pub is_default: bool,
    /// 升到本级所需签到次数
    pub to_level_times: i32,
    /// 升到本级的统计窗口天数
    pub to_level_days: i32,
    /// 保持本级所需签到次数
    pub keep_level_times: i32,
    /// 保级窗口天数，0 表示本级永久有效
    pub keep_level_days: i32,
    /// 签到积分倍率
    pub bonus_multiple: f64,
    pub next_level_code: Option<String>,
    /// 升入本级时发放的礼品
    pub up_level_gift_id: Option<i64>,
}

impl MemberLevelDefinition {
    /// 以 at 为起点计算本级的过期时间
    pub fn expire_from(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.keep_level_days > 0 {
            Some(at + Duration::days(self.keep_level_days as i64))
        } else {
            None
        }
    }
}

/// 会员在某品牌下的等级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberLevel {
    pub id: i64,
    pub brand_id: i64,
    pub member_id: i64,
    pub level_code: String,
    pub back_level_code: Option<String>,
    pub level_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemberLevel {
    /// 是否已过期
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.level_expire.is_some_and(|expire| expire < at)
    }

    /// 当前生效的等级编码
    ///
    /// 过期时回落到 back_level_code，没有回落等级则回到默认等级
    pub fn effective_level_code<'a>(&'a self, at: DateTime<Utc>, default_code: &'a str) -> &'a str {
        if self.is_expired(at) {
            self.back_level_code.as_deref().unwrap_or(default_code)
        } else {
            &self.level_code
        }
    }
}

/// 品牌的等级阶梯
#[derive(Debug, Clone, Default)]
pub struct LevelLadder {
    definitions: Vec<MemberLevelDefinition>,
}

impl LevelLadder {
    /// definitions 按 sort_order 排列
    pub fn new(mut definitions: Vec<MemberLevelDefinition>) -> Self {
        definitions.sort_by_key(|d| (d.sort_order, d.id));
        Self { definitions }
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, level_code: &str) -> Option<&MemberLevelDefinition> {
        self.definitions.iter().find(|d| d.level_code == level_code)
    }

    /// 默认等级：标记为默认的定义，没有则取排序第一的
    pub fn default_level(&self) -> Option<&MemberLevelDefinition> {
        self.definitions
            .iter()
            .find(|d| d.is_default)
            .or_else(|| self.definitions.first())
    }

    /// 沿 next_level_code 找下一级，顶级返回 None
    pub fn next_of(&self, current: &MemberLevelDefinition) -> Option<&MemberLevelDefinition> {
        current
            .next_level_code
            .as_deref()
            .and_then(|code| self.get(code))
    }

    /// 解析会员当前生效的等级定义
    pub fn resolve(&self, level: &MemberLevel, at: DateTime<Utc>) -> Option<&MemberLevelDefinition> {
        let default = self.default_level()?;
        let code = level.effective_level_code(at, &default.level_code);
        self.get(code).or(Some(default))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn definition(id: i64, code: &str, sort: i32, next: Option<&str>) -> MemberLevelDefinition {
        MemberLevelDefinition {
            id,
            brand_id: 1,
            level_code: code.to_string(),
            name: code.to_string(),
            sort_order: sort,
            is_default: sort == 0,
            to_level_times: 3,
            to_level_days: 30,
            keep_level_times: 3,
            keep_level_days: 30,
            bonus_multiple: 1.0 + sort as f64 * 0.5,
            next_level_code: next.map(String::from),
            up_level_gift_id: None,
        }
    }

    pub fn ladder() -> LevelLadder {
        LevelLadder::new(vec![
            definition(3, "GOLD", 2, None),
            definition(1, "BRONZE", 0, Some("SILVER")),
            definition(2, "SILVER", 1, Some("GOLD")),
        ])
    }

    pub fn member_level(code: &str, back: Option<&str>, expire: Option<DateTime<Utc>>) -> MemberLevel {
        let now = Utc::now();
        MemberLevel {
            id: 10,
            brand_id: 1,
            member_id: 100,
            level_code: code.to_string(),
            back_level_code: back.map(String::from),
            level_expire: expire,
            created_at: now,
            updated_at: now,
        }
    }
}
