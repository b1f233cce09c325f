//! 字段解析
//!
//! 按点号路径从输入文档中取值，如 "order.items.0.price"。

use serde_json::Value;

/// 评估上下文 - 提供给规则引擎的输入数据
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    data: &'a Value,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self { data }
    }

    /// 获取字段值
    ///
    /// 路径按 `.` 切分逐段解析：
    /// - 当前值为 null 时停止解析，返回 None
    /// - 段是规范的非负整数（"01" 不算）且当前值为数组时按下标取值
    /// - 否则把当前值视为对象按键取值
    ///
    /// 任何走不通的路径都返回 None，不会报错。
    /// 路径末端为 null 时返回 `Some(Value::Null)`，与字段不存在区分。
    pub fn get_field(&self, path: &str) -> Option<&'a Value> {
        let mut current = self.data;

        for segment in path.split('.') {
            current = match current {
                Value::Null => return None,
                Value::Array(items) => items.get(array_index(segment)?)?,
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// 获取底层数据
    pub fn data(&self) -> &'a Value {
        self.data
    }
}

/// 段的字符串形式与解析出的整数完全一致时才视为数组下标
fn array_index(segment: &str) -> Option<usize> {
    let index: usize = segment.parse().ok()?;
    (index.to_string() == segment).then_some(index)
}
