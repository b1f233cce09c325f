//! HTTP 请求与响应体

use crate::models::{ExecutionLog, Rule, RunOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /api/engine/run` 请求体
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEngineRequest {
    /// 非空时直接使用这些规则，否则使用启用规则
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
    /// 缺省或 null 时拒绝请求
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub options: Option<RunOptions>,
    /// 仅在使用启用规则时生效
    #[serde(default)]
    pub rule_ids: Option<Vec<String>>,
}

/// `GET /api/engine/logs` 查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<ExecutionLog>,
}
