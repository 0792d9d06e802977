//! NFC 签到
//!
//! 签到编排的纯计算部分：地理围栏、签到间隔和奖励报价。
//! 编排本身在 [`crate::service::SignInService`] 中，在一个工作单元内完成。

pub mod bonus;
pub mod cooldown;
pub mod geofence;

pub use bonus::BonusQuote;
