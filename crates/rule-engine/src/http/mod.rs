//! HTTP 接口
//!
//! 路由定义、共享状态和中间件装配。

pub mod dto;
pub mod error;
pub mod handlers;

use crate::service::RuleEngineService;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use rules_shared::observability::middleware as obs_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Axum 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub service: RuleEngineService,
    /// 日志查询未指定 limit 时的条数
    pub default_log_limit: usize,
}

impl AppState {
    pub fn new(service: RuleEngineService, default_log_limit: usize) -> Self {
        Self {
            service,
            default_log_limit,
        }
    }
}

/// 引擎相关路由
pub fn engine_routes() -> Router<AppState> {
    Router::new()
        .route("/engine/run", post(handlers::run_engine))
        .route("/engine/logs", get(handlers::engine_logs))
}

/// 构建完整应用
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", engine_routes())
        .route("/health", get(handlers::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RuleEngine;
    use crate::store::InMemoryRuleStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_app(store: InMemoryRuleStore) -> Router {
        let service = RuleEngineService::new(Arc::new(RuleEngine::new()), Arc::new(store));
        router(AppState::new(service, 50))
    }

    async fn post_run(app: Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/engine/run")
                    .header("Content-Type", "application/json")
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_run_with_body_rules() {
        let app = create_test_app(InMemoryRuleStore::new());

        let (status, body) = post_run(
            app,
            json!({
                "rules": [{
                    "id": "vip",
                    "name": "VIP discount",
                    "conditions": [{"field": "user.isVip", "operator": "==", "value": true}],
                    "action": {"type": "discount", "value": 10}
                }],
                "input": {"user": {"isVip": true}}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "body");
        assert_eq!(body["result"]["matched"], true);
        assert_eq!(body["result"]["combinedAction"], json!([{"type": "discount", "value": 10}]));
    }

    #[tokio::test]
    async fn test_run_requires_input() {
        let app = create_test_app(InMemoryRuleStore::new());

        let (status, body) = post_run(app.clone(), json!({"rules": []})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INPUT_REQUIRED");

        let (status, _) = post_run(app, json!({"input": null})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_rule() {
        let app = create_test_app(InMemoryRuleStore::new());

        let (status, body) = post_run(
            app,
            json!({
                "rules": [{"id": "r1", "name": "", "action": {"type": "flag"}}],
                "input": {}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_run_without_active_rules() {
        let app = create_test_app(InMemoryRuleStore::new());

        let (status, body) = post_run(app, json!({"input": {"a": 1}})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "store");
        assert_eq!(body["message"], "No active rules found");
        assert_eq!(body["result"]["combinedAction"], Value::Null);
    }

    #[tokio::test]
    async fn test_logs_endpoint() {
        let app = create_test_app(InMemoryRuleStore::new());
        let rules = json!([{
            "id": "r1",
            "name": "always",
            "conditions": [{"field": "a", "operator": ">=", "value": 0}],
            "action": {"type": "flag", "value": true}
        }]);

        for i in 0..3 {
            post_run(app.clone(), json!({"rules": rules, "input": {"a": i}})).await;
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/engine/logs?limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let logs = body["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["inputSummary"], r#"{"a":2}"#);
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app(InMemoryRuleStore::new());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
