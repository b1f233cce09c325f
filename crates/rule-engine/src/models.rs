//! 规则引擎领域模型

use crate::executor::RuleExecutor;
use crate::resolver::EvaluationContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// 规则定义
///
/// 条件按顺序以 AND 语义短路求值；条件列表为空时规则永不匹配。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Rule {
    #[validate(length(min = 1, message = "规则 ID 不能为空"))]
    pub id: String,
    #[validate(length(min = 1, message = "规则名称不能为空"))]
    pub name: String,
    #[serde(default)]
    #[validate(nested)]
    pub conditions: Vec<Condition>,
    pub action: Action,
    #[serde(default)]
    pub priority: i64,
}

impl Rule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, action: Action) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            conditions: Vec::new(),
            action,
            priority: 0,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// 对输入数据评估规则，内部任何异常都按不匹配处理
    pub fn evaluate(&self, input: &Value) -> bool {
        RuleExecutor::new()
            .execute(self, &EvaluationContext::new(input))
            .matched
    }
}

/// 条件节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Condition {
    #[validate(length(min = 1, message = "条件字段不能为空"))]
    pub field: String,
    /// 原始操作符字符串，缺省等价于 `==`
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator.into()),
            value: value.into(),
        }
    }

    /// 原始操作符，未设置时为空串
    pub fn operator(&self) -> &str {
        self.operator.as_deref().unwrap_or_default()
    }
}

/// 规则动作
///
/// 引擎不解释动作内容，仅在 merge 合并模式下识别 `discount` 类型。
/// 除 type/value 之外的字段原样保留。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Action {
    pub fn new(action_type: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            action_type: action_type.into(),
            value: value.into(),
            extra: Map::new(),
        }
    }

    /// 折扣动作
    pub fn discount(value: impl Into<Value>) -> Self {
        Self::new(DISCOUNT_ACTION, value)
    }
}

/// merge 模式下可累加的动作类型
pub const DISCOUNT_ACTION: &str = "discount";

/// 存储层规则记录
///
/// 存储中的 priority 可以缺省，转换为 [`Rule`] 时按 0 处理。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    #[validate(length(min = 1, message = "规则 ID 不能为空"))]
    pub id: String,
    #[validate(length(min = 1, message = "规则名称不能为空"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub conditions: Vec<Condition>,
    pub action: Action,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl From<RuleRecord> for Rule {
    fn from(record: RuleRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            conditions: record.conditions,
            action: record.action,
            priority: record.priority.unwrap_or(0),
        }
    }
}

impl From<Rule> for RuleRecord {
    fn from(rule: Rule) -> Self {
        Self {
            id: rule.id,
            name: rule.name,
            description: None,
            conditions: rule.conditions,
            action: rule.action,
            priority: Some(rule.priority),
            active: true,
            tags: Vec::new(),
        }
    }
}

/// 动作合并模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// 全部为数值折扣时累加为一个折扣，否则同 All
    Merge,
    /// 只取第一条命中规则的动作
    First,
    /// 按优先级顺序返回全部动作
    #[default]
    All,
}

/// 单次运行选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOptions {
    pub stop_on_first_match: bool,
    pub combine_actions: CombineMode,
    pub rule_ids_to_run: Option<Vec<String>>,
}

impl RunOptions {
    pub fn stop_on_first_match(mut self) -> Self {
        self.stop_on_first_match = true;
        self
    }

    pub fn combine(mut self, mode: CombineMode) -> Self {
        self.combine_actions = mode;
        self
    }

    pub fn only_rules<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_ids_to_run = Some(ids.into_iter().map(Into::into).collect());
        self
    }
}

/// 命中的规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub id: String,
    pub name: String,
    pub action: Action,
}

/// 合并后的动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CombinedAction {
    Single(Action),
    List(Vec<Action>),
}

/// 单条规则的诊断信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDiagnostic {
    pub rule_id: String,
    pub rule_name: String,
    pub matched: bool,
    pub duration_ms: f64,
    /// 第一个不满足的条件下标
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_condition_index: Option<usize>,
}

/// 单次运行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub matched: bool,
    pub applied_rules: Vec<AppliedRule>,
    pub combined_action: Option<CombinedAction>,
    pub diagnostics: Vec<RuleDiagnostic>,
}

impl RunResult {
    /// 没有任何规则参与时的结果
    pub fn empty() -> Self {
        Self {
            matched: false,
            applied_rules: Vec::new(),
            combined_action: None,
            diagnostics: Vec::new(),
        }
    }
}

/// 执行日志
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// 截断后的输入 JSON
    pub input_summary: String,
    pub result: RunResult,
    pub duration_ms: f64,
}
