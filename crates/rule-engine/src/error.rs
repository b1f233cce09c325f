//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则解析失败: {0}")]
    ParseError(String),

    #[error("规则校验失败: {0}")]
    ValidationError(String),

    #[error("未知的操作符: {0}")]
    UnknownOperator(String),

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("规则来源不可用: {0}")]
    SourceUnavailable(String),
}

impl From<validator::ValidationErrors> for RuleError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::ValidationError(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
