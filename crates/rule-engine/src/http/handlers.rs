//! HTTP 处理函数

use super::AppState;
use super::dto::{LogsQuery, LogsResponse, RunEngineRequest};
use super::error::ApiError;
use crate::service::EngineRunResponse;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use tracing::instrument;

/// 执行一轮规则评估
#[instrument(skip_all)]
pub async fn run_engine(
    State(state): State<AppState>,
    payload: Result<Json<RunEngineRequest>, JsonRejection>,
) -> Result<Json<EngineRunResponse>, ApiError> {
    let Json(request) = payload?;

    if request.input.is_null() {
        return Err(ApiError::InputRequired);
    }

    let options = request.options.unwrap_or_default();

    let response = match request.rules.filter(|rules| !rules.is_empty()) {
        Some(rules) => state.service.evaluate_rules(rules, &request.input, &options)?,
        None => {
            let rule_ids = request.rule_ids.unwrap_or_default();
            state
                .service
                .evaluate_active(&request.input, &options, &rule_ids)
                .await?
        }
    };

    Ok(Json(response))
}

/// 最近的执行日志
pub async fn engine_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Json<LogsResponse> {
    let limit = query.limit.unwrap_or(state.default_log_limit);
    Json(LogsResponse {
        logs: state.service.logs(limit),
    })
}

/// 存活探针
pub async fn health_check() -> &'static str {
    "OK"
}
