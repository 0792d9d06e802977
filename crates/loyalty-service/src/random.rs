//! 随机数来源
//!
//! 签到奖励和抽奖都从这里取随机数，测试与基准中可替换为固定种子或 mock。

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 随机数来源
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send + Sync {
    /// `[0, 1)` 区间的均匀分布
    fn unit(&self) -> f64;

    /// `[low, high]` 闭区间的均匀整数
    fn between(&self, low: i64, high: i64) -> i64;
}

/// 线程本地随机数生成器
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }

    fn between(&self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        rand::rng().random_range(low..=high)
    }
}

/// 固定种子的随机数生成器，结果可复现
///
/// 仅供测试和基准使用，服务装配使用 [`ThreadRandom`]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn unit(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random::<f64>()
    }

    fn between(&self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random_range(low..=high)
    }
}
