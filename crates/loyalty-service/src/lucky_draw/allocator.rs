//! 加权随机分配器
//!
//! 规则按配置顺序排列，只有仍有库存的奖项和未中奖兜底项参与抽取。
//! 参与项概率之和不足 1 时，差额作为隐式"未中奖"份额追加在末尾，
//! 保证每个奖项的实际中奖率收敛到配置的概率。

use tracing::error;

use crate::error::{LoyaltyError, Result};
use crate::models::LuckyDrawRule;
use crate::random::RandomSource;

/// 概率累加的浮点容差
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// 抽取结果
#[derive(Debug, Clone, PartialEq)]
pub enum Allocation {
    /// 抽中有奖项
    Prize(LuckyDrawRule),
    /// 未中奖；命中显式兜底项时带上规则 ID
    Blank { rule_id: Option<i64> },
}

impl Allocation {
    pub fn is_prize(&self) -> bool {
        matches!(self, Self::Prize(_))
    }

    pub fn rule_id(&self) -> Option<i64> {
        match self {
            Self::Prize(rule) => Some(rule.id),
            Self::Blank { rule_id } => *rule_id,
        }
    }
}

/// 加权随机分配器
pub struct Allocator<'a> {
    random: &'a dyn RandomSource,
}

impl<'a> Allocator<'a> {
    pub fn new(random: &'a dyn RandomSource) -> Self {
        Self { random }
    }

    /// 校验规则配置
    ///
    /// 每个概率必须在 [0, 1]，参与抽取的概率之和不能超过 1，
    /// 有奖项的单次扣减数量必须大于 0
    pub fn validate(rules: &[LuckyDrawRule]) -> Result<()> {
        for rule in rules {
            if !(0.0..=1.0).contains(&rule.probability) {
                return Err(LoyaltyError::InvalidProbability(format!(
                    "规则 {} 的概率 {} 超出 [0, 1]",
                    rule.id, rule.probability
                )));
            }
            if !rule.is_blank() && rule.quantity <= 0 {
                return Err(LoyaltyError::InvalidLuckyDrawRule(format!(
                    "规则 {} 的扣减数量 {} 必须大于 0",
                    rule.id, rule.quantity
                )));
            }
        }

        let total: f64 = Self::eligible(rules).map(|r| r.probability).sum();
        if total > 1.0 + PROBABILITY_EPSILON {
            return Err(LoyaltyError::InvalidProbability(format!(
                "参与抽取的概率之和 {} 大于 1",
                total
            )));
        }

        Ok(())
    }

    /// 抽取一次
    pub fn allocate(&self, rules: &[LuckyDrawRule]) -> Result<Allocation> {
        Self::validate(rules)?;

        let r = self.random.unit();
        if !(0.0..1.0).contains(&r) {
            error!(r = r, "随机数超出 [0, 1)");
            return Err(LoyaltyError::Allocation(format!("随机数 {} 超出 [0, 1)", r)));
        }

        Self::pick(rules, r)
    }

    /// 按累计概率选出第一个 accumulated >= r 的规则，最后一项包含右边界
    pub fn pick(rules: &[LuckyDrawRule], r: f64) -> Result<Allocation> {
        let eligible: Vec<&LuckyDrawRule> = Self::eligible(rules).collect();
        let total: f64 = eligible.iter().map(|r| r.probability).sum();

        // 概率之和不足 1 的部分视为未中奖
        let blank_share = (1.0 - total).max(0.0);
        let denominator = total + blank_share;
        if denominator <= 0.0 {
            return Ok(Allocation::Blank { rule_id: None });
        }

        let mut accumulated = 0.0;
        for (index, rule) in eligible.iter().enumerate() {
            accumulated += rule.probability;
            let is_last = index + 1 == eligible.len() && blank_share <= PROBABILITY_EPSILON;
            // 概率为 0 的规则不会命中
            if (accumulated / denominator >= r && rule.probability > 0.0) || is_last {
                return Ok(Self::outcome(rule));
            }
        }

        if blank_share > PROBABILITY_EPSILON {
            return Ok(Allocation::Blank { rule_id: None });
        }

        error!(r = r, total = total, rules = eligible.len(), "没有可命中的奖项");
        Err(LoyaltyError::Allocation(format!(
            "没有可命中的奖项: r = {}, total = {}",
            r, total
        )))
    }

    fn eligible(rules: &[LuckyDrawRule]) -> impl Iterator<Item = &LuckyDrawRule> {
        rules.iter().filter(|r| r.is_eligible())
    }

    fn outcome(rule: &LuckyDrawRule) -> Allocation {
        if rule.is_blank() {
            Allocation::Blank {
                rule_id: Some(rule.id),
            }
        } else {
            Allocation::Prize(rule.clone())
        }
    }
}
