//! 周期状态机的纯计算部分

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 周期时间窗口
///
/// 过期时间与结束时间一致；过期的周期不再被查到，下一次签到新建周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodWindow {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
}

impl PeriodWindow {
    /// 从 at 开始、持续 days 天的窗口，不超过 hard_end
    pub fn open(at: DateTime<Utc>, days: i32, hard_end: Option<DateTime<Utc>>) -> Self {
        let natural_end = at + Duration::days(days as i64);
        let end_at = match hard_end {
            Some(hard_end) if hard_end < natural_end => hard_end,
            _ => natural_end,
        };

        Self {
            start_at: at,
            end_at,
            expire_at: end_at,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start_at <= at && at <= self.expire_at
    }
}

/// 周期达成阈值：days 天内签到 times 次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub times: i32,
    pub days: i32,
    pub hard_end: Option<DateTime<Utc>>,
}

impl Threshold {
    /// 次数或天数未配置（<= 0）时没有阈值，周期不启动
    pub fn new(times: i32, days: i32) -> Option<Self> {
        if times <= 0 || days <= 0 {
            return None;
        }
        Some(Self {
            times,
            days,
            hard_end: None,
        })
    }

    pub fn with_hard_end(mut self, hard_end: DateTime<Utc>) -> Self {
        self.hard_end = Some(hard_end);
        self
    }

    /// 以 at 为起点的新窗口
    pub fn window(&self, at: DateTime<Utc>) -> PeriodWindow {
        PeriodWindow::open(at, self.days, self.hard_end)
    }

    pub fn is_reached(&self, progress: i32) -> bool {
        progress >= self.times
    }

    /// 距离达成还差的次数
    pub fn remaining(&self, progress: i32) -> i32 {
        (self.times - progress).max(0)
    }
}

/// 周期达成后的收尾方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 结束周期
    Finish,
    /// 原地续期，从达成时刻开始下一轮
    Renew,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_requires_times_and_days() {
        assert!(Threshold::new(0, 30).is_none());
        assert!(Threshold::new(3, 0).is_none());
        assert!(Threshold::new(-1, 30).is_none());
        assert!(Threshold::new(3, 30).is_some());
    }

    #[test]
    fn test_threshold_reached() {
        let threshold = Threshold::new(3, 30).unwrap();
        assert!(!threshold.is_reached(2));
        assert!(threshold.is_reached(3));
        assert!(threshold.is_reached(4));
        assert_eq!(threshold.remaining(1), 2);
        assert_eq!(threshold.remaining(5), 0);
    }

    #[test]
    fn test_window_from_sign_in_time() {
        let at = Utc::now();
        let window = Threshold::new(3, 7).unwrap().window(at);

        assert_eq!(window.start_at, at);
        assert_eq!(window.end_at, at + Duration::days(7));
        assert_eq!(window.expire_at, window.end_at);
        assert!(window.contains(at + Duration::days(7)));
        assert!(!window.contains(at + Duration::days(7) + Duration::seconds(1)));
    }

    #[test]
    fn test_window_capped_by_hard_end() {
        let at = Utc::now();
        let campaign_end = at + Duration::days(2);
        let window = Threshold::new(3, 7)
            .unwrap()
            .with_hard_end(campaign_end)
            .window(at);

        assert_eq!(window.end_at, campaign_end);
        assert_eq!(window.expire_at, campaign_end);
    }

    #[test]
    fn test_hard_end_after_natural_end_is_ignored() {
        let at = Utc::now();
        let window = PeriodWindow::open(at, 7, Some(at + Duration::days(30)));
        assert_eq!(window.end_at, at + Duration::days(7));
    }
}
