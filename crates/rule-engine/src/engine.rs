//! 规则引擎
//!
//! 持有按优先级排序的规则集和执行日志，对单个输入执行一轮批量评估。
//!
//! 规则集以写时复制快照保存：每次运行先取得一份一致的快照，运行期间的
//! 增删改不会影响本轮评估顺序。所有方法只需要 `&self`，可通过 `Arc` 共享。

use crate::executor::RuleExecutor;
use crate::history::ExecutionLogRing;
use crate::models::{
    Action, AppliedRule, CombineMode, CombinedAction, DISCOUNT_ACTION, ExecutionLog, Rule,
    RuleDiagnostic, RunOptions, RunResult,
};
use crate::resolver::EvaluationContext;
use arc_swap::ArcSwap;
use chrono::Utc;
use parking_lot::Mutex;
use rules_shared::config::EngineConfig;
use rules_shared::observability::metrics;
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// 规则引擎
pub struct RuleEngine {
    rules: ArcSwap<Vec<Rule>>,
    logs: Mutex<ExecutionLogRing>,
    executor: RuleExecutor,
    input_summary_chars: usize,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            rules: ArcSwap::from_pointee(Vec::new()),
            logs: Mutex::new(ExecutionLogRing::new(config.log_capacity)),
            executor: RuleExecutor::new(),
            input_summary_chars: config.input_summary_chars,
        }
    }

    /// 以给定规则集创建引擎
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let engine = Self::new();
        engine.set_rules(rules);
        engine
    }

    /// 启用条件级评估追踪
    pub fn with_trace(mut self) -> Self {
        self.executor = self.executor.with_trace();
        self
    }

    /// 当前规则数量
    pub fn len(&self) -> usize {
        self.rules.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.load().is_empty()
    }

    /// 添加规则，同优先级排在已有规则之后
    #[instrument(skip(self, rule), fields(rule_id = %rule.id, priority = rule.priority))]
    pub fn add_rule(&self, rule: Rule) {
        self.rules.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(rule.clone());
            sort_by_priority(&mut next);
            next
        });
        metrics::set_active_rules(self.len());
        debug!("规则已添加");
    }

    /// 删除规则，返回是否找到该 ID
    #[instrument(skip(self))]
    pub fn remove_rule(&self, rule_id: &str) -> bool {
        let mut removed = false;
        self.rules.rcu(|current| {
            let mut next = Vec::clone(current);
            removed = match next.iter().position(|r| r.id == rule_id) {
                Some(index) => {
                    next.remove(index);
                    true
                }
                None => false,
            };
            next
        });

        metrics::set_active_rules(self.len());
        if removed {
            debug!("规则已删除");
        }
        removed
    }

    /// 替换整个规则集
    #[instrument(skip(self, rules), fields(count = rules.len()))]
    pub fn set_rules(&self, rules: Vec<Rule>) {
        self.replace(rules);
        info!("规则集已替换");
    }

    /// 清空规则集
    pub fn clear_rules(&self) {
        self.rules.store(Arc::new(Vec::new()));
        metrics::set_active_rules(0);
        info!("规则集已清空");
    }

    /// 规则集快照，调用方修改不影响引擎内部状态
    pub fn rules(&self) -> Vec<Rule> {
        self.rules.load().as_ref().clone()
    }

    /// 对当前规则集执行一轮评估
    pub fn run(&self, input: &Value, options: &RunOptions) -> RunResult {
        let snapshot = self.rules.load_full();
        self.run_on(&snapshot, input, options)
    }

    /// 替换规则集并基于这份规则集执行评估
    ///
    /// 替换和评估使用同一份快照，并发请求之间不会读到彼此的规则。
    pub fn run_with_rules(&self, rules: Vec<Rule>, input: &Value, options: &RunOptions) -> RunResult {
        let snapshot = self.replace(rules);
        self.run_on(&snapshot, input, options)
    }

    /// 最近 `limit` 条执行日志，最新在前
    pub fn logs(&self, limit: usize) -> Vec<ExecutionLog> {
        self.logs.lock().recent(limit)
    }

    pub fn clear_logs(&self) {
        self.logs.lock().clear();
    }

    fn replace(&self, mut rules: Vec<Rule>) -> Arc<Vec<Rule>> {
        sort_by_priority(&mut rules);
        let snapshot = Arc::new(rules);
        self.rules.store(Arc::clone(&snapshot));
        metrics::set_active_rules(snapshot.len());
        snapshot
    }

    #[instrument(
        name = "engine_run",
        skip_all,
        fields(
            rules = rules.len(),
            stop_on_first_match = options.stop_on_first_match,
            combine = ?options.combine_actions,
        )
    )]
    fn run_on(&self, rules: &[Rule], input: &Value, options: &RunOptions) -> RunResult {
        let start = Instant::now();
        let context = EvaluationContext::new(input);

        let selected: Option<HashSet<&str>> = options
            .rule_ids_to_run
            .as_ref()
            .filter(|ids| !ids.is_empty())
            .map(|ids| ids.iter().map(String::as_str).collect());

        let candidates = rules
            .iter()
            .filter(|rule| selected.as_ref().is_none_or(|ids| ids.contains(rule.id.as_str())));

        let mut applied_rules = Vec::new();
        let mut diagnostics = Vec::new();

        for rule in candidates {
            let rule_start = Instant::now();
            let outcome = self.executor.execute(rule, &context);

            diagnostics.push(RuleDiagnostic {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                matched: outcome.matched,
                duration_ms: millis(rule_start.elapsed()),
                failed_condition_index: outcome.failed_condition_index,
            });

            if outcome.matched {
                applied_rules.push(AppliedRule {
                    id: rule.id.clone(),
                    name: rule.name.clone(),
                    action: rule.action.clone(),
                });
                if options.stop_on_first_match {
                    break;
                }
            }
        }

        let result = RunResult {
            matched: !applied_rules.is_empty(),
            combined_action: combine_actions(&applied_rules, options.combine_actions),
            applied_rules,
            diagnostics,
        };

        let elapsed = start.elapsed();
        self.record(input, &result, elapsed);
        metrics::record_engine_run(result.applied_rules.len(), elapsed.as_secs_f64());

        debug!(
            matched = result.matched,
            applied = result.applied_rules.len(),
            evaluated = result.diagnostics.len(),
            "引擎运行完成"
        );

        result
    }

    fn record(&self, input: &Value, result: &RunResult, elapsed: Duration) {
        let entry = ExecutionLog {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            input_summary: summarize(input, self.input_summary_chars),
            result: result.clone(),
            duration_ms: millis(elapsed),
        };

        self.logs.lock().push(entry);
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 按优先级降序的稳定排序，同优先级保持插入顺序
fn sort_by_priority(rules: &mut [Rule]) {
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// 按合并模式汇总命中规则的动作
pub fn combine_actions(applied: &[AppliedRule], mode: CombineMode) -> Option<CombinedAction> {
    match mode {
        CombineMode::First => applied
            .first()
            .map(|rule| CombinedAction::Single(rule.action.clone())),
        CombineMode::All => Some(all_actions(applied)),
        CombineMode::Merge => merge_actions(applied),
    }
}

fn all_actions(applied: &[AppliedRule]) -> CombinedAction {
    CombinedAction::List(applied.iter().map(|rule| rule.action.clone()).collect())
}

/// 全部为数值折扣时累加为一个折扣动作，否则退化为 All
fn merge_actions(applied: &[AppliedRule]) -> Option<CombinedAction> {
    if applied.is_empty() {
        return None;
    }

    let all_discounts = applied
        .iter()
        .all(|rule| rule.action.action_type == DISCOUNT_ACTION && rule.action.value.is_number());

    if !all_discounts {
        return Some(all_actions(applied));
    }

    let total = sum_numbers(applied.iter().map(|rule| &rule.action.value));
    Some(CombinedAction::Single(Action::discount(total)))
}

/// 全为整数时按整数累加，否则按浮点累加
fn sum_numbers<'a>(values: impl Iterator<Item = &'a Value> + Clone) -> Value {
    let integer_sum = values
        .clone()
        .try_fold(0i64, |acc, v| v.as_i64().and_then(|n| acc.checked_add(n)));

    if let Some(sum) = integer_sum {
        return Value::from(sum);
    }

    let sum: f64 = values.filter_map(Value::as_f64).sum();
    Number::from_f64(sum).map(Value::Number).unwrap_or(Value::Null)
}

/// 序列化输入并截断到指定字符数
fn summarize(input: &Value, max_chars: usize) -> String {
    let serialized = serde_json::to_string(input).unwrap_or_default();
    match serialized.char_indices().nth(max_chars) {
        Some((end, _)) => serialized[..end].to_string(),
        None => serialized,
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
