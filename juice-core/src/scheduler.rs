//! # Scheduler 模块
//!
//! 按触发时间排序的延迟回调队列（"N 秒后执行"）。
//!
//! 每帧由 [`Stage`](crate::stage::Stage) 取出到期项执行。同一时刻到期的
//! 回调按登记顺序执行。节点被移除时，它名下的回调一并取消。

use std::collections::HashSet;

use tracing::trace;

use crate::scene::NodeId;
use crate::stage::Stage;

/// 延迟回调
pub type Continuation = Box<dyn FnOnce(&mut Stage)>;

struct Entry {
    fire_at: f64,
    owner: NodeId,
    callback: Continuation,
}

/// 延迟回调队列
#[derive(Default)]
pub struct Scheduler {
    /// 按 fire_at 升序；同一时刻保持登记顺序
    entries: Vec<Entry>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.entries.len())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记在绝对时刻 `fire_at` 执行的回调
    pub fn schedule(&mut self, owner: NodeId, fire_at: f64, callback: Continuation) {
        let position = self
            .entries
            .partition_point(|e| e.fire_at.total_cmp(&fire_at).is_le());
        self.entries.insert(
            position,
            Entry {
                fire_at,
                owner,
                callback,
            },
        );
        trace!(node = %owner, fire_at, "登记延迟回调");
    }

    /// 取出所有 `fire_at <= now` 的回调（按触发顺序）
    pub fn drain_due(&mut self, now: f64) -> Vec<(NodeId, Continuation)> {
        let due = self.entries.partition_point(|e| e.fire_at <= now);
        self.entries
            .drain(..due)
            .map(|e| (e.owner, e.callback))
            .collect()
    }

    /// 取消属于这些节点的回调，返回取消数量
    pub fn cancel_owned_by(&mut self, owners: &HashSet<NodeId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !owners.contains(&e.owner));
        before - self.entries.len()
    }

    /// 待执行数量
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// 最早的触发时刻
    pub fn next_fire_time(&self) -> Option<f64> {
        self.entries.first().map(|e| e.fire_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Continuation {
        Box::new(|_| {})
    }

    #[test]
    fn test_drain_in_fire_order() {
        let mut scheduler = Scheduler::new();
        let a = NodeId::new(1);
        let b = NodeId::new(2);
        scheduler.schedule(a, 2.0, noop());
        scheduler.schedule(b, 1.0, noop());
        scheduler.schedule(a, 1.0, noop());

        assert_eq!(scheduler.next_fire_time(), Some(1.0));
        let due = scheduler.drain_due(1.5);
        let owners: Vec<_> = due.iter().map(|(owner, _)| *owner).collect();
        // 同一时刻按登记顺序
        assert_eq!(owners, vec![b, a]);
        assert_eq!(scheduler.pending(), 1);

        assert!(scheduler.drain_due(1.9).is_empty());
        assert_eq!(scheduler.drain_due(2.0).len(), 1);
    }

    #[test]
    fn test_cancel_owned_by() {
        let mut scheduler = Scheduler::new();
        let a = NodeId::new(1);
        let b = NodeId::new(2);
        scheduler.schedule(a, 1.0, noop());
        scheduler.schedule(b, 1.0, noop());
        scheduler.schedule(a, 3.0, noop());

        let cancelled = scheduler.cancel_owned_by(&HashSet::from([a]));
        assert_eq!(cancelled, 2);
        assert_eq!(scheduler.pending(), 1);
    }
}
