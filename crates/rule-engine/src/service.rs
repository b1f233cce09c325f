//! 规则评估服务
//!
//! 面向接入层的两种评估方式：请求中直接携带规则，或使用规则来源中启用的规则。

use crate::engine::RuleEngine;
use crate::error::Result;
use crate::models::{ExecutionLog, Rule, RunOptions, RunResult};
use crate::store::RuleSource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// 启用规则为空时返回的提示
pub const NO_ACTIVE_RULES_MESSAGE: &str = "No active rules found";

/// 本次评估使用的规则来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunSource {
    /// 请求体携带的规则
    Body,
    /// 规则来源中的启用规则
    Store,
}

/// 评估响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRunResponse {
    pub run_id: String,
    pub source: RunSource,
    pub result: RunResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EngineRunResponse {
    fn new(source: RunSource, result: RunResult) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            source,
            result,
            message: None,
        }
    }
}

/// 规则评估服务
#[derive(Clone)]
pub struct RuleEngineService {
    engine: Arc<RuleEngine>,
    source: Arc<dyn RuleSource>,
}

impl RuleEngineService {
    pub fn new(engine: Arc<RuleEngine>, source: Arc<dyn RuleSource>) -> Self {
        Self { engine, source }
    }

    pub fn engine(&self) -> &Arc<RuleEngine> {
        &self.engine
    }

    /// 使用请求携带的规则评估
    ///
    /// 规则先整体校验，任一规则不合法则拒绝整个请求。
    #[instrument(skip_all, fields(rules = rules.len()))]
    pub fn evaluate_rules(
        &self,
        rules: Vec<Rule>,
        input: &Value,
        options: &RunOptions,
    ) -> Result<EngineRunResponse> {
        for rule in &rules {
            rule.validate()?;
        }

        let result = self.engine.run_with_rules(rules, input, options);
        Ok(EngineRunResponse::new(RunSource::Body, result))
    }

    /// 使用启用规则评估
    ///
    /// 没有任何启用规则时直接返回空结果，不运行引擎也不记录日志。
    #[instrument(skip_all, fields(rule_ids = rule_ids.len()))]
    pub async fn evaluate_active(
        &self,
        input: &Value,
        options: &RunOptions,
        rule_ids: &[String],
    ) -> Result<EngineRunResponse> {
        let rules = self.source.list_active(rule_ids).await?;

        if rules.is_empty() {
            info!("没有启用的规则");
            let mut response = EngineRunResponse::new(RunSource::Store, RunResult::empty());
            response.message = Some(NO_ACTIVE_RULES_MESSAGE.to_string());
            return Ok(response);
        }

        let result = self.engine.run_with_rules(rules, input, options);
        Ok(EngineRunResponse::new(RunSource::Store, result))
    }

    /// 最近的执行日志，最新在前
    pub fn logs(&self, limit: usize) -> Vec<ExecutionLog> {
        self.engine.logs(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::models::{Action, CombineMode, CombinedAction, Condition};
    use crate::store::MockRuleSource;
    use serde_json::json;

    fn discount_rule(id: &str, field: &str, value: i64, priority: i64) -> Rule {
        Rule::new(id, format!("rule {}", id), Action::discount(value))
            .with_condition(Condition::new(field, "==", true))
            .with_priority(priority)
    }

    fn service_with(source: MockRuleSource) -> RuleEngineService {
        RuleEngineService::new(Arc::new(RuleEngine::new()), Arc::new(source))
    }

    #[test]
    fn test_evaluate_rules_from_body() {
        let service = service_with(MockRuleSource::new());
        let rules = vec![
            discount_rule("vip", "isVip", 10, 1),
            discount_rule("first", "firstOrder", 5, 2),
        ];
        let options = RunOptions::default().combine(CombineMode::Merge);

        let response = service
            .evaluate_rules(rules, &json!({"isVip": true, "firstOrder": true}), &options)
            .unwrap();

        assert_eq!(response.source, RunSource::Body);
        assert_eq!(response.result.applied_rules[0].id, "first");
        assert_eq!(
            response.result.combined_action,
            Some(CombinedAction::Single(Action::discount(15)))
        );
        assert_eq!(service.logs(10).len(), 1);
    }

    #[test]
    fn test_evaluate_rules_rejects_invalid_rule() {
        let service = service_with(MockRuleSource::new());
        let rules = vec![Rule::new("", "missing id", Action::discount(1))];

        let result = service.evaluate_rules(rules, &json!({}), &RunOptions::default());

        assert!(matches!(result, Err(RuleError::ValidationError(_))));
        assert!(service.logs(10).is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_active_runs_store_rules() {
        let mut source = MockRuleSource::new();
        source
            .expect_list_active()
            .times(1)
            .returning(|_| Ok(vec![discount_rule("vip", "isVip", 10, 0)]));
        let service = service_with(source);

        let response = service
            .evaluate_active(&json!({"isVip": true}), &RunOptions::default(), &[])
            .await
            .unwrap();

        assert_eq!(response.source, RunSource::Store);
        assert!(response.result.matched);
        assert!(response.message.is_none());
    }

    #[tokio::test]
    async fn test_evaluate_active_passes_rule_ids() {
        let mut source = MockRuleSource::new();
        source
            .expect_list_active()
            .withf(|ids: &[String]| ids == ["vip".to_string()])
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let service = service_with(source);

        service
            .evaluate_active(&json!({}), &RunOptions::default(), &["vip".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_evaluate_active_without_rules() {
        let mut source = MockRuleSource::new();
        source.expect_list_active().returning(|_| Ok(Vec::new()));
        let service = service_with(source);

        let response = service
            .evaluate_active(&json!({"isVip": true}), &RunOptions::default(), &[])
            .await
            .unwrap();

        assert_eq!(response.result, RunResult::empty());
        assert_eq!(response.message.as_deref(), Some(NO_ACTIVE_RULES_MESSAGE));
        assert!(service.logs(10).is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_active_propagates_source_error() {
        let mut source = MockRuleSource::new();
        source
            .expect_list_active()
            .returning(|_| Err(RuleError::SourceUnavailable("connection refused".to_string())));
        let service = service_with(source);

        let result = service
            .evaluate_active(&json!({}), &RunOptions::default(), &[])
            .await;

        assert!(matches!(result, Err(RuleError::SourceUnavailable(_))));
    }

    #[test]
    fn test_response_wire_format() {
        let mut response = EngineRunResponse::new(RunSource::Store, RunResult::empty());
        response.message = Some(NO_ACTIVE_RULES_MESSAGE.to_string());

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["source"], "store");
        assert_eq!(value["message"], NO_ACTIVE_RULES_MESSAGE);
        assert!(value["runId"].is_string());
        assert_eq!(value["result"]["appliedRules"], json!([]));
    }
}
