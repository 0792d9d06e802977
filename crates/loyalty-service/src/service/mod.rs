//! 服务层
//!
//! 编排仓储、账本、等级与周期引擎，对外提供签到、抽奖和钱包查询能力。

pub mod dto;
mod lucky_draw_service;
mod sign_in_service;
mod wallet_service;

pub use dto::*;
pub use lucky_draw_service::LuckyDrawService;
pub use sign_in_service::SignInService;
pub use wallet_service::WalletService;
