//! 同一门店的签到间隔

use chrono::{DateTime, Duration, Utc};

use crate::error::{LoyaltyError, Result};

/// 校验与最近一次签到的间隔
///
/// 最近一次签到可能晚于 at（客户端回填时间），按两者的绝对间隔判断。
/// 未满间隔时返回剩余秒数（向上取整）
pub fn check(
    nearest_sign_in_at: Option<DateTime<Utc>>,
    at: DateTime<Utc>,
    interval_minutes: i32,
) -> Result<()> {
    let Some(nearest) = nearest_sign_in_at else {
        return Ok(());
    };
    if interval_minutes <= 0 {
        return Ok(());
    }

    let interval = Duration::minutes(interval_minutes as i64);
    let elapsed = (at - nearest).abs();
    if elapsed >= interval {
        return Ok(());
    }

    let remaining = interval - elapsed;
    let mut remaining_seconds = remaining.num_seconds();
    if remaining.num_milliseconds() % 1000 != 0 {
        remaining_seconds += 1;
    }

    Err(LoyaltyError::SignInTooFrequent { remaining_seconds })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sign_in_allowed() {
        assert!(check(None, Utc::now(), 60).is_ok());
    }

    #[test]
    fn test_second_sign_in_within_interval_rejected() {
        let first = Utc::now();
        let err = check(Some(first), first + Duration::minutes(10), 60).unwrap_err();
        assert!(matches!(
            err,
            LoyaltyError::SignInTooFrequent { remaining_seconds: 3000 }
        ));
    }

    #[test]
    fn test_remaining_seconds_round_up() {
        let first = Utc::now();
        let at = first + Duration::minutes(59) + Duration::milliseconds(500);
        assert!(matches!(
            check(Some(first), at, 60),
            Err(LoyaltyError::SignInTooFrequent { remaining_seconds: 60 })
        ));
    }

    #[test]
    fn test_sign_in_after_interval_allowed() {
        let first = Utc::now();
        assert!(check(Some(first), first + Duration::minutes(60), 60).is_ok());
    }

    #[test]
    fn test_backdated_sign_in_within_interval_rejected() {
        let latest = Utc::now();
        let err = check(Some(latest), latest - Duration::minutes(10), 60).unwrap_err();
        assert!(matches!(
            err,
            LoyaltyError::SignInTooFrequent { remaining_seconds: 3000 }
        ));
    }

    #[test]
    fn test_backdated_sign_in_outside_interval_allowed() {
        let latest = Utc::now();
        assert!(check(Some(latest), latest - Duration::minutes(90), 60).is_ok());
    }

    #[test]
    fn test_zero_interval_disables_cooldown() {
        let first = Utc::now();
        assert!(check(Some(first), first, 0).is_ok());
    }
}
