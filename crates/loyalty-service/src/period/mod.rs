//! 签到周期引擎
//!
//! 保级、升级、打卡三类累计周期共用一套状态机：
//!
//! - `machine`: 窗口与阈值的纯计算
//! - `strategy`: 三类周期的阈值来源与完成动作
//! - `engine`: 在工作单元内推进周期

mod engine;
mod machine;
mod strategy;

pub use engine::{PeriodContext, PeriodEngine, PeriodReport, PeriodTransition};
pub use machine::{Completion, PeriodWindow, Threshold};
pub use strategy::PeriodPlan;
