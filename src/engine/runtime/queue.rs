//! ### English
//! Pending work queue and the state guarded together with it by the bridge lock.
//!
//! ### 中文
//! 待处理工作队列，以及与它一起受 bridge 锁保护的状态。

use std::mem;

use crate::engine::frame::FrameHandoff;

use super::work_item::WorkItem;

/// ### English
/// Unbounded FIFO of pending work items.
///
/// Producers append under the bridge lock; the consumer swaps the whole list out in one step and
/// processes it without holding the lock.
///
/// ### 中文
/// 无界 FIFO 待处理工作队列。
///
/// 生产者在 bridge 锁内追加；消费者一步把整个列表交换出来，并在不持锁的情况下处理。
pub(crate) struct EventQueue {
    items: Vec<WorkItem>,
    /// ### English
    /// Close flag used to discard new work after teardown.
    ///
    /// ### 中文
    /// 关闭标记：销毁后丢弃新的工作条目。
    closed: bool,
}

impl EventQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            closed: false,
        }
    }

    /// ### English
    /// Appends one item; returns `false` (dropping the item) if the queue is closed.
    ///
    /// #### Parameters
    /// - `item`: Work item to append.
    ///
    /// ### 中文
    /// 追加一个条目；若队列已关闭则丢弃该条目并返回 `false`。
    ///
    /// #### 参数
    /// - `item`：要追加的工作条目。
    pub(crate) fn push(&mut self, item: WorkItem) -> bool {
        if self.closed {
            return false;
        }
        self.items.push(item);
        true
    }

    /// ### English
    /// Swaps the pending items into `local` (which must be empty), leaving `local`'s allocation
    /// behind for the next round of producers.
    ///
    /// ### 中文
    /// 把待处理条目交换到 `local`（必须为空），并把 `local` 的分配留给下一轮生产者复用。
    pub(crate) fn swap_into(&mut self, local: &mut Vec<WorkItem>) {
        debug_assert!(local.is_empty());
        mem::swap(&mut self.items, local);
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// ### English
    /// Closes the queue and returns whatever was still pending.
    ///
    /// ### 中文
    /// 关闭队列并返回仍未处理的条目。
    pub(crate) fn close(&mut self) -> Vec<WorkItem> {
        self.closed = true;
        mem::take(&mut self.items)
    }
}

/// ### English
/// Everything guarded by the bridge lock: the queue and the frame handoff state.
///
/// ### 中文
/// bridge 锁保护的全部状态：队列与帧交接状态。
pub(crate) struct SharedState {
    pub(crate) queue: EventQueue,
    pub(crate) handoff: FrameHandoff,
}

impl SharedState {
    pub(crate) fn new(queue_capacity: usize) -> Self {
        Self {
            queue: EventQueue::with_capacity(queue_capacity),
            handoff: FrameHandoff::default(),
        }
    }
}
