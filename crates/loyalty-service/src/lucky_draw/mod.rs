//! 抽奖
//!
//! `allocator` 负责按概率选出奖项，库存扣减与记录写入由服务层在工作单元内完成。

mod allocator;

pub use allocator::{Allocation, Allocator, PROBABILITY_EPSILON};
