//! 规则操作符定义
//!
//! 操作符在规则中以字符串形式出现，评估前先经过别名归一化。
//! 归一化后不在规范集合内的字符串原样保留，评估时按未知操作符处理。

use std::borrow::Cow;
use std::fmt;

/// 条件操作符（规范集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // 数值比较
    Gt,
    Lt,
    Gte,
    Lte,

    // 通用比较
    Eq,
    Neq,

    // 包含检查
    Contains,
    In,
    Between,

    // 字符串操作
    StartsWith,
    EndsWith,
}

impl Operator {
    /// 全部规范操作符
    pub const ALL: [Operator; 11] = [
        Self::Gt,
        Self::Lt,
        Self::Gte,
        Self::Lte,
        Self::Eq,
        Self::Neq,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::In,
        Self::Between,
    ];

    /// 规范键
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::In => "in",
            Self::Between => "between",
        }
    }

    /// 将别名或规范键解析为操作符，未知操作符返回 None
    pub fn resolve(op: &str) -> Option<Self> {
        let key = op.trim().to_lowercase();
        let operator = match key.as_str() {
            "" | "==" | "=" | "eq" | "equal" | "equals" => Self::Eq,
            "!=" | "<>" | "ne" | "neq" | "notequals" | "not_equals" | "not" => Self::Neq,
            ">" | "gt" | "greater" | "greaterthan" | "greater_than" => Self::Gt,
            "<" | "lt" | "less" | "lessthan" | "less_than" => Self::Lt,
            ">=" | "gte" | "greaterorequal" | "greater_or_equal" => Self::Gte,
            "<=" | "lte" | "lessorequal" | "less_or_equal" => Self::Lte,
            "contains" | "includes" => Self::Contains,
            "startswith" | "starts_with" | "start" => Self::StartsWith,
            "endswith" | "ends_with" | "end" => Self::EndsWith,
            "in" => Self::In,
            "between" => Self::Between,
            _ => return None,
        };
        Some(operator)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 操作符归一化
///
/// 已知别名映射为规范键；空字符串视为 `==`；
/// 其余输入返回去除首尾空白并转小写后的结果，不会被强制映射为默认操作符。
pub fn normalize(op: &str) -> Cow<'static, str> {
    match Operator::resolve(op) {
        Some(operator) => Cow::Borrowed(operator.as_str()),
        None => Cow::Owned(op.trim().to_lowercase()),
    }
}
