//! 规则评估引擎
//!
//! 对单个 JSON 输入批量评估按优先级排序的规则，支持：
//! - 点分路径字段解析和带别名的比较操作符
//! - 条件 AND 短路求值，异常按不匹配处理
//! - 首个命中即停止、动作合并（first/all/merge）
//! - 有界的执行日志
//! - HTTP 服务接口

pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod history;
pub mod http;
pub mod models;
pub mod operators;
pub mod resolver;
pub mod service;
pub mod store;

pub use engine::{RuleEngine, combine_actions};
pub use error::{Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use executor::{RuleExecutor, RuleOutcome};
pub use models::{
    Action, AppliedRule, CombineMode, CombinedAction, Condition, ExecutionLog, Rule,
    RuleDiagnostic, RuleRecord, RunOptions, RunResult,
};
pub use operators::{Operator, normalize};
pub use resolver::EvaluationContext;
pub use service::{EngineRunResponse, RuleEngineService, RunSource};
pub use store::{InMemoryRuleStore, RuleSource, RuleStoreStats};
