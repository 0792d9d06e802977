//! 签到奖励计算

use serde::Serialize;

use crate::models::GlobalSettings;
use crate::random::RandomSource;

/// 一次签到的奖励报价
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusQuote {
    /// 乘以等级倍率前的随机奖励
    pub original_bonus: i64,
    /// 会员实得奖励
    pub bonus: i64,
    pub bonus_multiple: f64,
    /// 品牌佣金
    pub commission: i64,
}

impl BonusQuote {
    /// 在 [bonus_start, bonus_end] 内随机取值，再乘等级倍率（四舍五入）；
    /// 佣金按会员实得奖励的百分比向下取整
    pub fn compute(settings: &GlobalSettings, bonus_multiple: f64, random: &dyn RandomSource) -> Self {
        let low = settings.bonus_start.max(0);
        let high = settings.bonus_end.max(low);
        let original_bonus = random.between(low, high);

        let multiple = if bonus_multiple.is_finite() && bonus_multiple > 0.0 {
            bonus_multiple
        } else {
            1.0
        };
        let bonus = (original_bonus as f64 * multiple).round() as i64;

        let percent = settings.commission_percent.clamp(0, 100) as i64;
        let commission = bonus * percent / 100;

        Self {
            original_bonus,
            bonus,
            bonus_multiple: multiple,
            commission,
        }
    }
}
