//! 数据库仓储层
//!
//! 封装全部 SQL 操作。仓储只负责持久化，不包含业务逻辑；
//! 事务由调用方通过工作单元控制，写操作以 `_in_tx` 形式提供。

mod gift_exchange_repo;
mod level_repo;
mod lucky_draw_repo;
mod period_repo;
mod settings_repo;
mod sign_in_repo;
mod traits;
mod wallet_repo;

pub use gift_exchange_repo::GiftExchangeRepository;
pub use level_repo::LevelRepository;
pub use lucky_draw_repo::{LuckyDrawRepository, NewLuckyDrawRecord};
pub use period_repo::{NewPeriod, PeriodRepository};
pub use settings_repo::SettingsRepository;
pub use sign_in_repo::SignInRepository;
pub use traits::*;
pub use wallet_repo::WalletRepository;
