//! 周期策略
//!
//! 三类周期的差别只在阈值来源、关联对象和达成后的收尾方式

use crate::models::{ClockInCampaign, MemberLevelDefinition, PeriodType};

use super::machine::{Completion, Threshold};

/// 一次签到要推进的周期
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodPlan {
    /// 保级：关联当前生效等级，使用保级次数/天数
    Retention { level: MemberLevelDefinition },
    /// 升级：关联目标等级，使用升级次数/天数
    Promotion { target: MemberLevelDefinition },
    /// 打卡：关联活动，窗口不超过活动结束时间
    ClockIn { campaign: ClockInCampaign },
}

impl PeriodPlan {
    pub fn period_type(&self) -> PeriodType {
        match self {
            Self::Retention { .. } => PeriodType::RetentionLevel,
            Self::Promotion { .. } => PeriodType::UpLevel,
            Self::ClockIn { .. } => PeriodType::ClockIn,
        }
    }

    pub fn relate_id(&self) -> i64 {
        match self {
            Self::Retention { level } => level.id,
            Self::Promotion { target } => target.id,
            Self::ClockIn { campaign } => campaign.id,
        }
    }

    pub fn threshold(&self) -> Option<Threshold> {
        match self {
            Self::Retention { level } => {
                Threshold::new(level.keep_level_times, level.keep_level_days)
            }
            Self::Promotion { target } => {
                Threshold::new(target.to_level_times, target.to_level_days)
            }
            Self::ClockIn { campaign } => {
                Threshold::new(campaign.clock_in_times, campaign.cycle_days_length)
                    .map(|t| t.with_hard_end(campaign.end_at))
            }
        }
    }

    pub fn completion(&self) -> Completion {
        match self {
            Self::Retention { .. } => Completion::Renew,
            Self::Promotion { .. } | Self::ClockIn { .. } => Completion::Finish,
        }
    }

    /// 完成后能否开始新一轮，不循环的打卡活动每个会员只能完成一次
    pub fn repeatable(&self) -> bool {
        match self {
            Self::ClockIn { campaign } => campaign.loop_enabled,
            _ => true,
        }
    }
}
