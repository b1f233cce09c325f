//! 条件评估器
//!
//! 实现各操作符的比较语义。所有谓词对类型不匹配宽容处理，直接返回 false。

use crate::error::{Result, RuleError};
use crate::operators::Operator;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 评估条件
    ///
    /// # Arguments
    /// * `field_value` - 从上下文中获取的字段值，None 表示字段不存在
    /// * `operator` - 规则中的原始操作符字符串（评估前归一化）
    /// * `expected_value` - 规则中定义的期望值
    ///
    /// 字段不存在时任何操作符都不匹配；未知操作符返回 `UnknownOperator` 错误。
    pub fn evaluate(
        field_value: Option<&Value>,
        operator: &str,
        expected_value: &Value,
    ) -> Result<bool> {
        let Some(operator) = Operator::resolve(operator) else {
            return Err(RuleError::UnknownOperator(operator.trim().to_lowercase()));
        };

        Ok(match field_value {
            Some(actual) => Self::apply(operator, actual, expected_value),
            None => false,
        })
    }

    /// 对已解析的操作符应用谓词
    pub fn apply(operator: Operator, actual: &Value, expected: &Value) -> bool {
        match operator {
            Operator::Gt => Self::compare(actual, expected, |a, b| a > b),
            Operator::Lt => Self::compare(actual, expected, |a, b| a < b),
            Operator::Gte => Self::compare(actual, expected, |a, b| a >= b),
            Operator::Lte => Self::compare(actual, expected, |a, b| a <= b),
            Operator::Eq => Self::eq(actual, expected),
            Operator::Neq => !Self::eq(actual, expected),
            Operator::Contains => Self::contains(actual, expected),
            Operator::StartsWith => Self::string_test(actual, expected, |s, p| s.starts_with(p)),
            Operator::EndsWith => Self::string_test(actual, expected, |s, p| s.ends_with(p)),
            Operator::In => Self::in_list(actual, expected),
            Operator::Between => Self::between(actual, expected),
        }
    }

    /// 数值比较，两侧都必须能转换为有限数值
    fn compare<F>(actual: &Value, expected: &Value, cmp: F) -> bool
    where
        F: Fn(f64, f64) -> bool,
    {
        match (as_number(actual), as_number(expected)) {
            (Some(a), Some(b)) => cmp(a, b),
            _ => false,
        }
    }

    /// 相等比较
    ///
    /// 依次尝试：严格相等、null 不等于任何值、数值比较、布尔字面量比较、
    /// 去空白后的字符串比较。数组和对象之间按结构比较。
    fn eq(actual: &Value, expected: &Value) -> bool {
        if strict_eq(actual, expected) {
            return true;
        }

        if actual.is_null() || expected.is_null() {
            return false;
        }

        if let (Some(a), Some(b)) = (as_number(actual), as_number(expected)) {
            return a == b;
        }

        match (string_form(actual), string_form(expected)) {
            (Some(a), Some(b)) => {
                let (a, b) = (a.trim(), b.trim());
                match (bool_literal(a), bool_literal(b)) {
                    (Some(x), Some(y)) => x == y,
                    _ => a == b,
                }
            }
            (None, None) => actual == expected,
            _ => false,
        }
    }

    /// 包含检查：数组做元素严格相等判断，标量做子串判断
    fn contains(actual: &Value, expected: &Value) -> bool {
        match actual {
            Value::Array(items) => items.iter().any(|item| strict_eq(item, expected)),
            _ => Self::string_test(actual, expected, |s, sub| s.contains(sub)),
        }
    }

    /// 标量字符串形式上的前缀/后缀/子串判断
    fn string_test<F>(actual: &Value, expected: &Value, test: F) -> bool
    where
        F: Fn(&str, &str) -> bool,
    {
        match (string_form(actual), string_form(expected)) {
            (Some(s), Some(pattern)) => test(&*s, &*pattern),
            _ => false,
        }
    }

    /// 列表包含检查 (in)，期望值必须是数组
    fn in_list(actual: &Value, expected: &Value) -> bool {
        match expected {
            Value::Array(items) => items.iter().any(|item| strict_eq(actual, item)),
            _ => false,
        }
    }

    /// 闭区间范围比较
    ///
    /// 期望值为 `[min, max]` 数组或 `{"min": .., "max": ..}` 对象
    fn between(actual: &Value, expected: &Value) -> bool {
        let Some(value) = as_number(actual) else {
            return false;
        };

        let bounds = match expected {
            Value::Array(items) if items.len() >= 2 => {
                as_number(&items[0]).zip(as_number(&items[1]))
            }
            Value::Object(map) => object_bounds(map),
            _ => None,
        };

        match bounds {
            Some((min, max)) => value >= min && value <= max,
            None => false,
        }
    }
}

fn object_bounds(map: &Map<String, Value>) -> Option<(f64, f64)> {
    let min = as_number(map.get("min")?)?;
    let max = as_number(map.get("max")?)?;
    Some((min, max))
}

/// 转换为有限数值
///
/// 数字直接使用；字符串去除首尾空白后须能完整解析为有限数值，空白串按 0 处理。
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().ok()?
            }
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// 标量的字符串形式，null、数组、对象没有字符串形式
pub(crate) fn string_form(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Number(n) => Some(Cow::Owned(number_string(n))),
        _ => None,
    }
}

/// 整数值的浮点数按整数输出（100.0 -> "100"）
fn number_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// 严格相等：同类型标量按值比较，数组和对象之间永不相等
pub(crate) fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => false,
    }
}

fn bool_literal(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
