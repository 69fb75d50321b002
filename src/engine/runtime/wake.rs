//! ### English
//! Coalesced cross-thread wake signaling.
//!
//! Producers call [`WakeCoalescer::request`] after every enqueue; only the first request after a
//! drain reaches the [`Waker`]. The drain clears the pending flag under the queue lock right before
//! it swaps the queue out, so any item enqueued after that swap is followed by a fresh wake.
//!
//! ### 中文
//! 合并的跨线程唤醒信号。
//!
//! 生产者每次入队后调用 [`WakeCoalescer::request`]；只有 drain 之后的第一次请求会到达 [`Waker`]。
//! drain 在队列锁内、交换队列之前清除 pending 标记，因此在交换之后入队的任何条目都会伴随一次新的唤醒。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use crossbeam_channel as channel;
use parking_lot::RwLock;

/// ### English
/// Wake sink for the consumer thread (an event-loop async handle, a parked thread, a channel...).
///
/// `wake` may be called from any producer thread and must not block.
///
/// ### 中文
/// 消费者线程的唤醒出口（事件循环 async 句柄、被 park 的线程、channel 等）。
///
/// `wake` 可能在任意生产者线程调用，且不得阻塞。
pub trait Waker: Send + Sync {
    fn wake(&self);
}

/// ### English
/// Wakes a parked consumer thread via `unpark`.
///
/// ### 中文
/// 通过 `unpark` 唤醒被 park 的消费者线程。
pub struct ThreadWaker {
    thread: thread::Thread,
}

impl ThreadWaker {
    pub fn new(thread: thread::Thread) -> Self {
        Self { thread }
    }

    /// ### English
    /// Waker targeting the calling thread.
    ///
    /// ### 中文
    /// 以当前调用线程为目标的 waker。
    pub fn current() -> Self {
        Self::new(thread::current())
    }
}

impl Waker for ThreadWaker {
    fn wake(&self) {
        self.thread.unpark();
    }
}

/// ### English
/// Wakes a consumer blocked on a capacity-1 channel. A full channel already means "wake pending".
///
/// ### 中文
/// 唤醒阻塞在容量为 1 的 channel 上的消费者；channel 已满即表示“已有待处理唤醒”。
pub struct ChannelWaker {
    tx: channel::Sender<()>,
}

impl Waker for ChannelWaker {
    fn wake(&self) {
        let _ = self.tx.try_send(());
    }
}

/// ### English
/// Creates a channel waker and the receiver the consumer waits on.
///
/// ### 中文
/// 创建 channel waker 以及消费者等待用的接收端。
pub fn wake_channel() -> (ChannelWaker, channel::Receiver<()>) {
    let (tx, rx) = channel::bounded(1);
    (ChannelWaker { tx }, rx)
}

pub(crate) struct WakeCoalescer {
    /// ### English
    /// Set by the first request after a drain; cleared by the drain.
    ///
    /// ### 中文
    /// drain 后的第一次请求置位；由 drain 清除。
    pending: AtomicBool,
    /// ### English
    /// Set at teardown; suppresses all further wakes.
    ///
    /// ### 中文
    /// 销毁时置位；之后的唤醒全部被抑制。
    closed: AtomicBool,
    /// ### English
    /// Number of wakes forwarded (or attempted with no waker installed).
    ///
    /// ### 中文
    /// 已转发的唤醒次数（包括未安装 waker 时的尝试）。
    issued: AtomicU64,
    waker: RwLock<Option<Arc<dyn Waker>>>,
}

impl WakeCoalescer {
    pub(crate) fn new(waker: Option<Arc<dyn Waker>>) -> Self {
        Self {
            pending: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            issued: AtomicU64::new(0),
            waker: RwLock::new(waker),
        }
    }

    /// ### English
    /// Requests a wake; only the transition from idle to pending reaches the waker.
    ///
    /// ### 中文
    /// 请求唤醒；只有从空闲切换到 pending 的那次会到达 waker。
    #[inline]
    pub(crate) fn request(&self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if self.pending.swap(true, Ordering::AcqRel) {
            return;
        }
        self.issued.fetch_add(1, Ordering::Relaxed);
        if let Some(waker) = self.waker.read().as_ref() {
            waker.wake();
        }
    }

    /// Called by the drain, under the queue lock, before swapping the queue out.
    #[inline]
    pub(crate) fn reset(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// ### English
    /// Replaces the waker. If a wake is already pending it is re-delivered to the new waker, so a
    /// consumer that installs its waker late does not miss work queued before.
    ///
    /// ### 中文
    /// 替换 waker。若已有待处理唤醒，会重新投递给新 waker，避免较晚安装 waker 的消费者错过之前入队的工作。
    pub(crate) fn set_waker(&self, waker: Option<Arc<dyn Waker>>) {
        let mut slot = self.waker.write();
        *slot = waker;
        if self.pending.load(Ordering::Acquire) && !self.closed.load(Ordering::Acquire) {
            if let Some(waker) = slot.as_ref() {
                waker.wake();
            }
        }
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.waker.write().take();
    }

    #[inline]
    pub(crate) fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}
