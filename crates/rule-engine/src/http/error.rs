//! HTTP 接口错误类型

use crate::error::RuleError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("input is required in body")]
    InputRequired,

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("Engine run failed")]
    EngineRunFailed(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InputRequired | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::EngineRunFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InputRequired => "INPUT_REQUIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::EngineRunFailed(_) => "ENGINE_RUN_FAILED",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 内部错误只记录日志，响应中不带细节
        if let Self::EngineRunFailed(details) = &self {
            tracing::error!(error = %details, "引擎运行失败");
        }

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<RuleError> for ApiError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::ParseError(_)
            | RuleError::ValidationError(_)
            | RuleError::UnknownOperator(_) => Self::Validation(err.to_string()),
            RuleError::RuleNotFound(_) | RuleError::SourceUnavailable(_) => {
                Self::EngineRunFailed(err.to_string())
            }
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (ApiError::InputRequired, StatusCode::BAD_REQUEST, "INPUT_REQUIRED"),
            (
                ApiError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                ApiError::EngineRunFailed("db down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "ENGINE_RUN_FAILED",
            ),
        ];

        for (error, status, code) in cases {
            assert_eq!(error.status_code(), status);
            assert_eq!(error.error_code(), code);
        }
    }

    #[test]
    fn test_from_rule_error() {
        let validation: ApiError = RuleError::ValidationError("id".to_string()).into();
        assert!(matches!(validation, ApiError::Validation(_)));

        let source: ApiError = RuleError::SourceUnavailable("timeout".to_string()).into();
        assert!(matches!(source, ApiError::EngineRunFailed(_)));
    }

    #[test]
    fn test_malformed_rules_json_maps_to_validation() {
        let err = crate::store::InMemoryRuleStore::new()
            .load_from_json("{not json")
            .unwrap_err();
        assert!(matches!(err, RuleError::ParseError(_)));

        let api: ApiError = err.into();
        assert_eq!(api.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let response = ApiError::EngineRunFailed("password=secret".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::EngineRunFailed("password=secret".to_string()).to_string(),
            "Engine run failed"
        );
    }
}
