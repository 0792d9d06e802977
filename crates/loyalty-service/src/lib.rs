//! NFC 签到积分服务
//!
//! 会员在门店碰 NFC 标签签到，获得随机积分奖励，并推进会员等级与打卡活动。
//!
//! ## 核心功能
//!
//! - **钱包账本**：按凭证幂等记账，余额行加锁，永不为负
//! - **工作单元**：一次业务操作对应一个数据库事务，提交后执行缓存失效
//! - **会员等级**：升级、保级与过期回落
//! - **签到周期**：保级、升级、打卡三类周期共用一个状态机
//! - **幸运抽奖**：按概率选出奖项并扣减库存
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 数据库仓储层
//! - `uow`: 工作单元
//! - `wallet`: 钱包账本与开户策略
//! - `level`: 会员等级引擎
//! - `period`: 签到周期引擎
//! - `lucky_draw`: 抽奖分配器
//! - `sign_in`: 地理围栏、签到间隔与奖励计算
//! - `service`: 业务服务层
//! - `api`: HTTP 接口层

pub mod api;
pub mod error;
pub mod level;
pub mod lucky_draw;
pub mod models;
pub mod period;
pub mod random;
pub mod repository;
pub mod service;
pub mod sign_in;
pub mod uow;
pub mod wallet;

pub use error::{ErrorKind, LoyaltyError, Result};
pub use level::LevelEngine;
pub use lucky_draw::{Allocation, Allocator};
pub use models::*;
pub use period::PeriodEngine;
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use service::{LuckyDrawService, SignInService, WalletService, dto};
pub use uow::UnitOfWork;
pub use wallet::{Ledger, ProvisionerRegistry};
