//! 仓储 Trait 定义
//!
//! 只读配置类数据通过 trait 暴露给服务层，便于 mock 测试；
//! 账本、周期等写路径直接使用 `_in_tx` 函数，在工作单元内执行

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{GlobalSettings, MemberLevel, MemberLevelDefinition};

/// 全局配置仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    async fn load_settings(&self) -> Result<GlobalSettings>;
}

/// 会员等级只读接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LevelRepositoryTrait: Send + Sync {
    async fn list_definitions(&self, brand_id: i64) -> Result<Vec<MemberLevelDefinition>>;
    async fn find_member_level(&self, brand_id: i64, member_id: i64) -> Result<Option<MemberLevel>>;
}
