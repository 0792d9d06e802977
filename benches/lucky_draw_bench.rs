//! 抽奖与签到计算性能基准测试
//!
//! 测试覆盖：
//! - 不同奖项数量下的加权随机抽取
//! - 概率配置校验
//! - 签到奖励计算

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use loyalty::lucky_draw::Allocator;
use loyalty::models::{GlobalSettings, LuckyDrawRule};
use loyalty::random::SeededRandom;
use loyalty::sign_in::BonusQuote;
use std::hint::black_box;

/// 创建 n 个等概率奖项，末尾附加一个未中奖兜底项
fn create_rules(prize_count: usize) -> Vec<LuckyDrawRule> {
    let share = 0.5 / prize_count as f64;
    let mut rules: Vec<LuckyDrawRule> = (0..prize_count)
        .map(|i| LuckyDrawRule {
            id: i as i64 + 1,
            lucky_draw_id: 1,
            level: i as i32 + 1,
            gift_id: Some(i as i64 + 100),
            probability: share,
            quantity: 1,
            total_quantity: 1000,
            residue_quantity: 1000,
            sort_order: i as i32,
        })
        .collect();

    rules.push(LuckyDrawRule {
        id: prize_count as i64 + 1,
        lucky_draw_id: 1,
        level: 0,
        gift_id: None,
        probability: 0.5,
        quantity: 0,
        total_quantity: 0,
        residue_quantity: 0,
        sort_order: prize_count as i32,
    });

    rules
}

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("lucky_draw_allocate");
    let random = SeededRandom::new(42);

    for prize_count in [1, 5, 20, 100] {
        let rules = create_rules(prize_count);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(prize_count),
            &rules,
            |b, rules| {
                let allocator = Allocator::new(&random);
                b.iter(|| allocator.allocate(black_box(rules)))
            },
        );
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let rules = create_rules(100);
    c.bench_function("lucky_draw_validate_100", |b| {
        b.iter(|| Allocator::validate(black_box(&rules)))
    });
}

fn bench_bonus_quote(c: &mut Criterion) {
    let settings = GlobalSettings {
        commission_percent: 10,
        ..Default::default()
    };
    let random = SeededRandom::new(7);

    c.bench_function("sign_in_bonus_quote", |b| {
        b.iter(|| BonusQuote::compute(black_box(&settings), black_box(1.5), &random))
    });
}

criterion_group!(benches, bench_allocate, bench_validate, bench_bonus_quote);
criterion_main!(benches);
