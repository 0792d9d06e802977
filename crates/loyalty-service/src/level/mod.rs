//! 会员等级引擎
//!
//! 负责读取会员当前等级、查找下一级，以及升级与保级两种等级变更。

mod engine;

pub use engine::{CurrentLevel, LevelChange, LevelEngine, Promotion};
