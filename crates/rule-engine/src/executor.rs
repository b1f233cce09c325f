//! 规则执行器
//!
//! 按顺序短路评估规则的条件列表（AND 语义），返回匹配结果和失败位置。

use crate::evaluator::ConditionEvaluator;
use crate::models::{Condition, Rule};
use crate::resolver::EvaluationContext;
use tracing::{debug, warn};

/// 单条规则的评估结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOutcome {
    pub matched: bool,
    /// 第一个不满足的条件下标，匹配或无条件时为 None
    pub failed_condition_index: Option<usize>,
}

impl RuleOutcome {
    fn matched() -> Self {
        Self {
            matched: true,
            failed_condition_index: None,
        }
    }

    fn failed_at(index: Option<usize>) -> Self {
        Self {
            matched: false,
            failed_condition_index: index,
        }
    }
}

/// 规则执行器
#[derive(Debug, Clone, Default)]
pub struct RuleExecutor {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用评估追踪（debug 级别日志）
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 执行规则评估
    ///
    /// 空条件列表永不匹配。评估过程中的任何错误都转换为不匹配，不会向外传播。
    pub fn execute(&self, rule: &Rule, context: &EvaluationContext<'_>) -> RuleOutcome {
        if rule.conditions.is_empty() {
            if self.trace_enabled {
                debug!(rule_id = %rule.id, "规则没有条件，按不匹配处理");
            }
            return RuleOutcome::failed_at(None);
        }

        for (index, cond) in rule.conditions.iter().enumerate() {
            if !self.evaluate_condition(rule, index, cond, context) {
                return RuleOutcome::failed_at(Some(index));
            }
        }

        RuleOutcome::matched()
    }

    /// 评估单个条件
    fn evaluate_condition(
        &self,
        rule: &Rule,
        index: usize,
        cond: &Condition,
        context: &EvaluationContext<'_>,
    ) -> bool {
        let Some(field_value) = context.get_field(&cond.field) else {
            if self.trace_enabled {
                debug!(rule_id = %rule.id, index, field = %cond.field, "字段不存在，AND 短路");
            }
            return false;
        };

        match ConditionEvaluator::evaluate(Some(field_value), cond.operator(), &cond.value) {
            Ok(matched) => {
                if self.trace_enabled {
                    debug!(
                        rule_id = %rule.id,
                        index,
                        field = %cond.field,
                        operator = cond.operator(),
                        expected = %cond.value,
                        actual = %field_value,
                        matched,
                        "条件评估"
                    );
                }
                matched
            }
            Err(e) => {
                warn!(rule_id = %rule.id, index, error = %e, "条件评估失败，按不匹配处理");
                false
            }
        }
    }
}
