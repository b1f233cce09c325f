//! 执行日志环形缓冲区
//!
//! 最新的记录在最前，超出容量时淘汰最旧的记录。仅保存在内存中，进程重启即清空。

use crate::models::ExecutionLog;
use std::collections::VecDeque;

/// 执行日志条数上限，也是默认容量
pub const DEFAULT_LOG_CAPACITY: usize = 200;

#[derive(Debug)]
pub struct ExecutionLogRing {
    entries: VecDeque<ExecutionLog>,
    capacity: usize,
}

impl ExecutionLogRing {
    /// 容量不超过 [`DEFAULT_LOG_CAPACITY`]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(DEFAULT_LOG_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 写入一条记录，返回被淘汰的记录
    pub fn push(&mut self, entry: ExecutionLog) -> Option<ExecutionLog> {
        self.entries.push_front(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        }
    }

    /// 最近的 `limit` 条记录，最新在前
    pub fn recent(&self, limit: usize) -> Vec<ExecutionLog> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ExecutionLogRing {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
