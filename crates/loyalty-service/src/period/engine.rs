//! 周期推进
//!
//! 单次签到对一个周期的处理流程：
//!
//! 1. 解析阈值，没有阈值直接跳过
//! 2. 查找运行中且未过期的周期（带锁）
//! 3. 找到：关联签到记录，新关联才计数
//! 4. 未找到：新建周期，首次签到计一次
//! 5. 达到阈值：执行完成动作，然后结束或续期

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use tracing::{debug, info};

use loyalty_shared::observability::metrics;

use super::machine::{Completion, Threshold};
use super::strategy::PeriodPlan;
use crate::error::{LoyaltyError, Result};
use crate::level::{LevelEngine, Promotion};
use crate::models::{GiftSourceType, MemberGiftExchange, NewGiftExchange, NfcSignInPeriod, PeriodType};
use crate::repository::{GiftExchangeRepository, NewPeriod, PeriodRepository};

/// 推进周期所需的签到上下文
#[derive(Debug, Clone, Copy)]
pub struct PeriodContext {
    pub member_id: i64,
    pub brand_id: i64,
    pub sign_in_record_id: i64,
    pub sign_in_at: DateTime<Utc>,
}

/// 本次签到对周期造成的变化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodTransition {
    /// 未配置阈值或活动已完成
    Skipped,
    /// 该签到已计入过此周期
    Duplicate,
    Created,
    Progressed,
    /// 达成后结束
    Succeeded,
    /// 达成后续期
    Renewed,
}

impl PeriodTransition {
    fn as_metric(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Duplicate => "duplicate",
            Self::Created => "created",
            Self::Progressed => "progressed",
            Self::Succeeded => "succeeded",
            Self::Renewed => "renewed",
        }
    }
}

/// 周期推进结果
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReport {
    pub period_type: PeriodType,
    pub relate_id: i64,
    pub period_id: Option<i64>,
    pub progress: i32,
    pub required: i32,
    pub transition: PeriodTransition,
    /// 升级周期达成时的升级结果
    pub promotion: Option<Promotion>,
    /// 打卡周期达成时的待领取礼品
    pub gift_exchange: Option<MemberGiftExchange>,
}

impl PeriodReport {
    fn skipped(plan: &PeriodPlan) -> Self {
        Self {
            period_type: plan.period_type(),
            relate_id: plan.relate_id(),
            period_id: None,
            progress: 0,
            required: 0,
            transition: PeriodTransition::Skipped,
            promotion: None,
            gift_exchange: None,
        }
    }

    fn of(plan: &PeriodPlan, period: &NfcSignInPeriod, threshold: &Threshold) -> Self {
        Self {
            period_type: plan.period_type(),
            relate_id: plan.relate_id(),
            period_id: Some(period.id),
            progress: period.progress(),
            required: threshold.times,
            transition: PeriodTransition::Progressed,
            promotion: None,
            gift_exchange: None,
        }
    }

    /// 距离达成还差的签到次数
    pub fn remaining(&self) -> Option<i32> {
        match self.transition {
            PeriodTransition::Skipped => None,
            PeriodTransition::Succeeded | PeriodTransition::Renewed => Some(0),
            _ => Some((self.required - self.progress).max(0)),
        }
    }

    pub fn level_up(&self) -> bool {
        self.promotion.is_some()
    }
}

/// 周期引擎
///
/// 无状态，写操作全部在调用方的工作单元内执行
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodEngine;

impl PeriodEngine {
    pub fn new() -> Self {
        Self
    }

    /// 按计划推进一个周期
    pub async fn track(
        &self,
        conn: &mut PgConnection,
        plan: &PeriodPlan,
        ctx: &PeriodContext,
        levels: &LevelEngine,
    ) -> Result<PeriodReport> {
        let period_type = plan.period_type();
        let relate_id = plan.relate_id();

        // 1. 解析阈值
        let Some(threshold) = plan.threshold() else {
            return Ok(PeriodReport::skipped(plan));
        };

        if !plan.repeatable()
            && PeriodRepository::has_finished(conn, period_type, ctx.member_id, relate_id).await?
        {
            debug!(
                period_type = period_type.as_str(),
                relate_id = relate_id,
                "活动已完成且不循环，跳过"
            );
            return Ok(PeriodReport::skipped(plan));
        }

        // 2. 查找运行中的周期
        let running = PeriodRepository::find_running_for_update(
            conn,
            period_type,
            ctx.member_id,
            relate_id,
            ctx.sign_in_at,
        )
        .await?;

        let (period, transition) = match running {
            // 3. 关联并计数
            Some(mut period) => {
                if !PeriodRepository::link_record_in_tx(conn, period.id, ctx.sign_in_record_id)
                    .await?
                {
                    let mut report = PeriodReport::of(plan, &period, &threshold);
                    report.transition = PeriodTransition::Duplicate;
                    return Ok(report);
                }

                period.sign_in_times = PeriodRepository::increment_in_tx(conn, period.id)
                    .await?
                    .ok_or_else(|| {
                        LoyaltyError::Internal(format!("周期 {} 已结束，无法计数", period.id))
                    })?;
                (period, PeriodTransition::Progressed)
            }
            // 4. 新建周期
            None => {
                let period = PeriodRepository::create_in_tx(
                    conn,
                    &NewPeriod {
                        period_type,
                        relate_id,
                        member_id: ctx.member_id,
                        brand_id: ctx.brand_id,
                        window: threshold.window(ctx.sign_in_at),
                    },
                )
                .await?;
                PeriodRepository::link_record_in_tx(conn, period.id, ctx.sign_in_record_id).await?;
                (period, PeriodTransition::Created)
            }
        };

        metrics::record_period_transition(period_type.as_str(), transition.as_metric());

        let mut report = PeriodReport::of(plan, &period, &threshold);
        report.transition = transition;

        if !threshold.is_reached(period.progress()) {
            return Ok(report);
        }

        // 5. 完成动作
        match plan {
            PeriodPlan::Retention { .. } => {
                levels.retain(conn, ctx.member_id, ctx.sign_in_at).await?;
            }
            PeriodPlan::Promotion { .. } => {
                report.promotion = levels.promote(conn, ctx.member_id, ctx.sign_in_at).await?;
            }
            PeriodPlan::ClockIn { campaign } => {
                if let Some(gift_id) = campaign.gift_id {
                    let exchange = GiftExchangeRepository::create_in_tx(
                        conn,
                        &NewGiftExchange {
                            member_id: ctx.member_id,
                            brand_id: ctx.brand_id,
                            gift_id,
                            source_type: GiftSourceType::ClockIn,
                            source_id: period.id,
                        },
                    )
                    .await?;
                    report.gift_exchange = Some(exchange);
                }
            }
        }

        report.transition = match plan.completion() {
            Completion::Finish => {
                PeriodRepository::finish_in_tx(conn, period.id).await?;
                PeriodTransition::Succeeded
            }
            Completion::Renew => {
                PeriodRepository::renew_in_tx(
                    conn,
                    period.id,
                    period.sign_in_times,
                    &threshold.window(ctx.sign_in_at),
                )
                .await?;
                PeriodTransition::Renewed
            }
        };

        metrics::record_period_transition(period_type.as_str(), report.transition.as_metric());

        info!(
            period_id = period.id,
            period_type = period_type.as_str(),
            relate_id = relate_id,
            member_id = ctx.member_id,
            sign_in_times = period.sign_in_times,
            transition = report.transition.as_metric(),
            "签到周期达成"
        );

        Ok(report)
    }
}
