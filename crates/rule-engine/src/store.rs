//! 规则存储管理
//!
//! `RuleSource` 是服务层获取启用规则的抽象；`InMemoryRuleStore` 使用 DashMap
//! 提供线程安全的内存实现，支持规则的加载、更新、删除、启停和批量操作。

use crate::error::{Result, RuleError};
use crate::models::{Rule, RuleRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument, warn};
use validator::Validate;

/// 启用规则来源
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// 列出启用的规则，按优先级降序
    ///
    /// `rule_ids` 非空时只返回其中列出的规则。
    async fn list_active(&self, rule_ids: &[String]) -> Result<Vec<Rule>>;
}

#[derive(Debug, Clone)]
struct StoredRule {
    record: RuleRecord,
    /// 首次加载的顺序，同优先级时按此排序
    seq: u64,
}

/// 内存规则存储
#[derive(Clone, Default)]
pub struct InMemoryRuleStore {
    rules: Arc<DashMap<String, StoredRule>>,
    next_seq: Arc<AtomicU64>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 加载规则，已存在的 ID 会被覆盖但保留原有顺序
    #[instrument(skip(self, record), fields(rule_id = %record.id))]
    pub fn load(&self, record: RuleRecord) -> Result<()> {
        record.validate()?;

        let rule_id = record.id.clone();
        let seq = self
            .rules
            .get(&rule_id)
            .map(|existing| existing.seq)
            .unwrap_or_else(|| self.next_seq.fetch_add(1, Ordering::Relaxed));

        self.rules.insert(rule_id.clone(), StoredRule { record, seq });

        info!("规则已加载: {}", rule_id);
        Ok(())
    }

    /// 从 JSON 数组加载规则，返回加载成功的规则 ID
    #[instrument(skip(self, json))]
    pub fn load_from_json(&self, json: &str) -> Result<Vec<String>> {
        let records: Vec<RuleRecord> =
            serde_json::from_str(json).map_err(|e| RuleError::ParseError(e.to_string()))?;
        self.load_batch(records)
    }

    /// 批量加载规则，单条失败不影响其余规则
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn load_batch(&self, records: Vec<RuleRecord>) -> Result<Vec<String>> {
        let mut loaded_ids = Vec::with_capacity(records.len());
        let mut errors = Vec::new();

        for record in records {
            let rule_id = record.id.clone();
            match self.load(record) {
                Ok(()) => loaded_ids.push(rule_id),
                Err(e) => errors.push((rule_id, e)),
            }
        }

        if !errors.is_empty() {
            warn!("批量加载部分失败: {:?}", errors);
        }

        info!("批量加载完成: {} 成功, {} 失败", loaded_ids.len(), errors.len());
        Ok(loaded_ids)
    }

    /// 更新已有规则
    #[instrument(skip(self, record), fields(rule_id = %record.id))]
    pub fn update(&self, record: RuleRecord) -> Result<()> {
        if !self.rules.contains_key(&record.id) {
            warn!("更新不存在的规则: {}", record.id);
            return Err(RuleError::RuleNotFound(record.id));
        }

        self.load(record)
    }

    #[instrument(skip(self))]
    pub fn delete(&self, rule_id: &str) -> Result<()> {
        if self.rules.remove(rule_id).is_some() {
            info!("规则已删除: {}", rule_id);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", rule_id);
            Err(RuleError::RuleNotFound(rule_id.to_string()))
        }
    }

    pub fn get(&self, rule_id: &str) -> Option<RuleRecord> {
        self.rules.get(rule_id).map(|r| r.record.clone())
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains_key(rule_id)
    }

    /// 全部规则记录，按加载顺序
    pub fn list_all(&self) -> Vec<RuleRecord> {
        let mut stored: Vec<StoredRule> = self.rules.iter().map(|r| r.value().clone()).collect();
        stored.sort_by_key(|r| r.seq);
        stored.into_iter().map(|r| r.record).collect()
    }

    /// 启用或停用规则
    #[instrument(skip(self))]
    pub fn set_active(&self, rule_id: &str, active: bool) -> Result<()> {
        match self.rules.get_mut(rule_id) {
            Some(mut stored) => {
                stored.record.active = active;
                info!("规则状态已更新");
                Ok(())
            }
            None => Err(RuleError::RuleNotFound(rule_id.to_string())),
        }
    }

    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.rules.len();
        self.rules.clear();
        info!("已清空 {} 条规则", count);
    }

    pub fn stats(&self) -> RuleStoreStats {
        let mut stats = RuleStoreStats::default();
        for entry in self.rules.iter() {
            let record = &entry.record;
            stats.rules_count += 1;
            if record.active {
                stats.active_count += 1;
            }
            stats.total_conditions += record.conditions.len();
        }
        stats
    }

    fn active_rules(&self, rule_ids: &[String]) -> Vec<Rule> {
        let selected: Option<HashSet<&str>> =
            (!rule_ids.is_empty()).then(|| rule_ids.iter().map(String::as_str).collect());

        let mut active: Vec<StoredRule> = self
            .rules
            .iter()
            .filter(|r| r.record.active)
            .filter(|r| selected.as_ref().is_none_or(|ids| ids.contains(r.record.id.as_str())))
            .map(|r| r.value().clone())
            .collect();

        sort_stored(&mut active);

        active.into_iter().map(|r| Rule::from(r.record)).collect()
    }
}

/// 优先级降序，同优先级按加载顺序
fn sort_stored(rules: &mut [StoredRule]) {
    rules.sort_by(|a, b| {
        let pa = a.record.priority.unwrap_or(0);
        let pb = b.record.priority.unwrap_or(0);
        pb.cmp(&pa).then(a.seq.cmp(&b.seq))
    });
}

#[async_trait]
impl RuleSource for InMemoryRuleStore {
    async fn list_active(&self, rule_ids: &[String]) -> Result<Vec<Rule>> {
        Ok(self.active_rules(rule_ids))
    }
}

/// 规则存储统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStoreStats {
    pub rules_count: usize,
    pub active_count: usize,
    /// 所有规则的条件总数
    pub total_conditions: usize,
}
