//! ### English
//! Consumer side of one player bridge: the drain loop and handler dispatch.
//!
//! ### 中文
//! 单个播放器 bridge 的消费者侧：drain 循环与处理函数分派。

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel as channel;
use tracing::{debug, trace, warn};

use crate::engine::frame::FrameRef;

use super::bridge::VideoBridge;
use super::handlers::Handlers;
use super::work_item::WorkItem;

/// ### English
/// Owned by the consumer thread. Drains the bridge's queue and runs the registered handlers.
///
/// Dropping the consumer performs a final drain and then tears the bridge down: later decoder
/// callbacks are accepted but their work is discarded and no wake is issued.
///
/// ### 中文
/// 由消费者线程持有。drain bridge 的队列并运行已注册的处理函数。
///
/// drop 时会做最后一次 drain，然后销毁 bridge：之后的解码器回调仍会被接受，但其工作会被丢弃，
/// 也不会再发出唤醒。
pub struct BridgeConsumer {
    bridge: Arc<VideoBridge>,
    handlers: Handlers,
    /// ### English
    /// Local batch swapped with the shared queue on each round; reused to avoid reallocating.
    ///
    /// ### 中文
    /// 每轮与共享队列交换的本地批次；复用以避免重复分配。
    batch: Vec<WorkItem>,
    /// ### English
    /// Receiver paired with the bridge's channel waker, if the consumer was created with one.
    ///
    /// ### 中文
    /// 与 bridge 的 channel waker 配对的接收端（若创建时使用了 channel waker）。
    wake_rx: Option<channel::Receiver<()>>,
}

impl BridgeConsumer {
    pub(crate) fn new(bridge: Arc<VideoBridge>, wake_rx: Option<channel::Receiver<()>>) -> Self {
        Self {
            bridge,
            handlers: Handlers::default(),
            batch: Vec::new(),
            wake_rx,
        }
    }

    /// ### English
    /// Producer handle to hand to the decoder threads.
    ///
    /// ### 中文
    /// 交给解码器线程使用的生产者句柄。
    pub fn bridge(&self) -> &Arc<VideoBridge> {
        &self.bridge
    }

    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut Handlers {
        &mut self.handlers
    }

    /// ### English
    /// Processes every pending item in enqueue order and returns how many were processed.
    ///
    /// Each round swaps the whole queue out under the lock and processes it unlocked, so handlers
    /// may cause new items to be queued; those are picked up by the next round. The loop ends once
    /// a swap comes back empty.
    ///
    /// ### 中文
    /// 按入队顺序处理所有待处理条目，并返回处理数量。
    ///
    /// 每轮在锁内把整个队列交换出来，在锁外处理，因此处理函数导致的新入队会在下一轮被处理。
    /// 当某次交换得到空列表时循环结束。
    pub fn drain(&mut self) -> usize {
        let mut processed = 0;
        let mut batch = std::mem::take(&mut self.batch);
        loop {
            self.bridge.swap_pending(&mut batch);
            if batch.is_empty() {
                break;
            }
            trace!(target: "vmem_bridge", id = self.bridge.id(), items = batch.len(), "draining batch");
            for item in batch.drain(..) {
                self.process(item);
                processed += 1;
            }
        }
        self.batch = batch;
        processed
    }

    fn process(&mut self, item: WorkItem) {
        match item {
            WorkItem::FormatSetup { descriptor } => {
                let Some(buffer) = self.handlers.frame_setup(&descriptor) else {
                    return;
                };
                if let Err(err) = self.bridge.attach(descriptor.generation(), buffer) {
                    warn!(
                        target: "vmem_bridge",
                        id = self.bridge.id(),
                        generation = descriptor.generation(),
                        %err,
                        "consumer buffer rejected; decoding continues into scratch"
                    );
                }
            }
            WorkItem::FrameReady { frame } => {
                self.handlers.frame_ready(frame.as_ref().map(FrameRef::new));
            }
            WorkItem::FrameCleanup => self.handlers.frame_cleanup(),
            WorkItem::PlayerEvent(event) => self.handlers.player_event(&event),
        }
    }

    /// ### English
    /// Blocks until a wake arrives or `timeout` elapses; returns whether work may be pending.
    ///
    /// Uses the channel receiver when the consumer has one; otherwise parks the current thread
    /// (pair with a [`super::ThreadWaker`] targeting it).
    ///
    /// #### Parameters
    /// - `timeout`: Maximum time to wait.
    ///
    /// ### 中文
    /// 阻塞直到收到唤醒或 `timeout` 到期；返回是否可能有待处理工作。
    ///
    /// 若消费者持有 channel 接收端则使用它；否则 park 当前线程（应配合指向该线程的
    /// [`super::ThreadWaker`] 使用）。
    ///
    /// #### 参数
    /// - `timeout`：最长等待时间。
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.bridge.pending_len() != 0 {
            return true;
        }
        match &self.wake_rx {
            Some(rx) => match rx.recv_timeout(timeout) {
                Ok(()) => true,
                Err(channel::RecvTimeoutError::Timeout) => self.bridge.pending_len() != 0,
                Err(channel::RecvTimeoutError::Disconnected) => false,
            },
            None => {
                thread::park_timeout(timeout);
                self.bridge.pending_len() != 0
            }
        }
    }

    /// ### English
    /// [`Self::wait_timeout`] followed by [`Self::drain`].
    ///
    /// ### 中文
    /// 先 [`Self::wait_timeout`]，再 [`Self::drain`]。
    pub fn wait_and_drain(&mut self, timeout: Duration) -> usize {
        if self.wait_timeout(timeout) {
            self.drain()
        } else {
            0
        }
    }
}

impl Drop for BridgeConsumer {
    fn drop(&mut self) {
        let processed = self.drain();
        let discarded = self.bridge.close();
        debug!(
            target: "vmem_bridge",
            id = self.bridge.id(),
            processed,
            discarded,
            "bridge consumer dropped"
        );
    }
}
