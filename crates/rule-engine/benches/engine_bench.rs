//! 规则引擎性能基准测试
//!
//! 覆盖条件评估、字段解析和不同规模规则集的整轮运行。

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rule_engine::{
    Action, CombineMode, Condition, ConditionEvaluator, EvaluationContext, Rule, RuleEngine,
    RunOptions,
};
use serde_json::{Value, json};
use std::hint::black_box;

fn create_input() -> Value {
    json!({
        "category": "electronics",
        "price": 25000,
        "user": {
            "tier": "gold",
            "tags": ["vip", "frequent", "newsletter"],
            "orders": [{"amount": 120}, {"amount": 80}]
        }
    })
}

fn create_rules(count: usize) -> Vec<Rule> {
    (0..count)
        .map(|i| {
            Rule::new(format!("rule-{}", i), format!("rule {}", i), Action::discount(1))
                .with_condition(Condition::new("category", "equals", "electronics"))
                .with_condition(Condition::new("price", "between", json!([i * 10, 30000])))
                .with_condition(Condition::new("user.tags", "contains", "vip"))
                .with_priority((i % 7) as i64)
        })
        .collect()
}

fn bench_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("operators");

    let cases = [
        ("gt", json!(1000), ">", json!(500)),
        ("eq_numeric_string", json!("42"), "==", json!(42)),
        ("contains_string", json!("hello world"), "contains", json!("world")),
        ("in", json!("gold"), "in", json!(["silver", "gold", "platinum"])),
        ("between", json!(15), "between", json!({"min": 10, "max": 20})),
        ("alias", json!(5), "greater_than_or_equal", json!(5)),
    ];

    for (name, actual, operator, expected) in &cases {
        group.bench_function(*name, |b| {
            b.iter(|| {
                ConditionEvaluator::evaluate(
                    black_box(Some(actual)),
                    black_box(operator),
                    black_box(expected),
                )
            })
        });
    }

    group.finish();
}

fn bench_field_resolution(c: &mut Criterion) {
    let input = create_input();
    let context = EvaluationContext::new(&input);

    c.bench_function("resolve_nested_path", |b| {
        b.iter(|| context.get_field(black_box("user.orders.1.amount")))
    });
}

fn bench_engine_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_run");
    let input = create_input();

    for size in [10, 100, 1000] {
        let engine = RuleEngine::from_rules(create_rules(size));

        group.bench_with_input(BenchmarkId::new("all", size), &size, |b, _| {
            b.iter(|| engine.run(black_box(&input), &RunOptions::default()))
        });

        let options = RunOptions::default()
            .stop_on_first_match()
            .combine(CombineMode::First);
        group.bench_with_input(BenchmarkId::new("stop_on_first", size), &size, |b, _| {
            b.iter(|| engine.run(black_box(&input), &options))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_operators, bench_field_resolution, bench_engine_run);
criterion_main!(benches);
