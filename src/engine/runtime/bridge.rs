//! ### English
//! Producer side of one player bridge: the shared queue, the frame handoff, and the wake coalescer.
//!
//! All producer entry points follow the same shape: mutate state and push under the bridge lock,
//! release the lock, then request a wake. Buffers retired by a transition are dropped after the
//! lock is released.
//!
//! ### 中文
//! 单个播放器 bridge 的生产者侧：共享队列、帧交接状态与唤醒合并器。
//!
//! 所有生产者入口的形态一致：在 bridge 锁内修改状态并入队，释放锁后再请求唤醒。
//! 状态转换中退役的缓冲在释放锁之后才 drop。

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::engine::config::BridgeConfig;
use crate::engine::error::Result;
use crate::engine::events::{self, NativeEvent};
use crate::engine::frame::{
    BufferOwnership, ConsumerBuffer, FrameBufferDescriptor, Negotiator, PixelFormat,
    PlanePointers,
};

use super::callbacks::DecoderCallbacks;
use super::queue::SharedState;
use super::wake::{WakeCoalescer, Waker};
use super::work_item::WorkItem;

/// ### English
/// Thread-safe producer handle for one player instance. Shared with decoder threads via `Arc`.
///
/// ### 中文
/// 单个播放器实例的线程安全生产者句柄，通过 `Arc` 与解码器线程共享。
pub struct VideoBridge {
    /// ### English
    /// Unique ID allocated by the registry.
    ///
    /// ### 中文
    /// 由注册表分配的唯一 ID。
    id: u32,
    shared: Mutex<SharedState>,
    negotiator: Negotiator,
    wake: WakeCoalescer,
    /// ### English
    /// Pixel format used by the next negotiation (`PixelFormat::as_abi` encoding).
    ///
    /// ### 中文
    /// 下一次协商使用的像素格式（以 `PixelFormat::as_abi` 编码）。
    pixel_format: AtomicU8,
    /// ### English
    /// Registry-wide live bridge counter, decremented on drop.
    ///
    /// ### 中文
    /// 注册表范围的存活 bridge 计数，drop 时递减。
    live: Arc<AtomicUsize>,
}

impl VideoBridge {
    pub(crate) fn new(
        id: u32,
        config: &BridgeConfig,
        waker: Option<Arc<dyn Waker>>,
        live: Arc<AtomicUsize>,
    ) -> Self {
        live.fetch_add(1, Ordering::AcqRel);
        Self {
            id,
            shared: Mutex::new(SharedState::new(config.initial_queue_capacity)),
            negotiator: Negotiator::new(),
            wake: WakeCoalescer::new(waker),
            pixel_format: AtomicU8::new(config.pixel_format as u8),
            live,
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// ### English
    /// Pixel format the next negotiation will use.
    ///
    /// ### 中文
    /// 下一次协商将使用的像素格式。
    pub fn pixel_format(&self) -> PixelFormat {
        PixelFormat::from_abi(u32::from(self.pixel_format.load(Ordering::Acquire)))
    }

    /// ### English
    /// Changes the pixel format for subsequent negotiations. The current layout is unaffected.
    ///
    /// ### 中文
    /// 修改之后协商所用的像素格式；当前布局不受影响。
    pub fn set_pixel_format(&self, format: PixelFormat) {
        self.pixel_format.store(format as u8, Ordering::Release);
        debug!(target: "vmem_bridge", id = self.id, format = format.as_str(), "pixel format set");
    }

    /// ### English
    /// Installs (or removes) the consumer's wake sink.
    ///
    /// ### 中文
    /// 安装（或移除）消费者的唤醒出口。
    pub fn set_waker(&self, waker: Option<Arc<dyn Waker>>) {
        self.wake.set_waker(waker);
    }

    pub fn ownership(&self) -> BufferOwnership {
        self.shared.lock().handoff.ownership()
    }

    /// ### English
    /// Current frame layout, if one has been negotiated.
    ///
    /// ### 中文
    /// 当前帧布局（若已协商）。
    pub fn descriptor(&self) -> Option<Arc<FrameBufferDescriptor>> {
        self.shared.lock().handoff.descriptor().cloned()
    }

    /// ### English
    /// Number of work items queued and not yet drained.
    ///
    /// ### 中文
    /// 已入队但尚未 drain 的工作条目数量。
    pub fn pending_len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// ### English
    /// Number of wakes delivered so far (after coalescing).
    ///
    /// ### 中文
    /// 目前为止发出的唤醒次数（合并之后）。
    pub fn wakes_issued(&self) -> u64 {
        self.wake.issued()
    }

    /// ### English
    /// Appends one item and requests a wake. Never fails; after teardown the item is discarded.
    ///
    /// ### 中文
    /// 追加一个条目并请求唤醒。不会失败；销毁之后条目会被丢弃。
    pub(crate) fn enqueue(&self, item: WorkItem) {
        let label = item.label();
        let accepted = self.shared.lock().queue.push(item);
        self.after_push(accepted, label);
    }

    fn after_push(&self, accepted: bool, label: &'static str) {
        if accepted {
            self.wake.request();
        } else {
            trace!(target: "vmem_bridge", id = self.id, item = label, "bridge closed; work item discarded");
        }
    }

    /// ### English
    /// Clears the wake flag and swaps all pending items into `local`, in one critical section.
    ///
    /// ### 中文
    /// 在同一临界区内清除唤醒标记并把全部待处理条目交换到 `local`。
    pub(crate) fn swap_pending(&self, local: &mut Vec<WorkItem>) {
        let mut shared = self.shared.lock();
        self.wake.reset();
        shared.queue.swap_into(local);
    }

    /// ### English
    /// Attaches the consumer's buffer for `generation` (drain time only).
    ///
    /// ### 中文
    /// 为 `generation` attach 消费者缓冲（仅在 drain 时）。
    pub(crate) fn attach(&self, generation: u64, buffer: ConsumerBuffer) -> Result<()> {
        let retired = self.shared.lock().handoff.attach(generation, buffer)?;
        drop(retired);
        debug!(target: "vmem_bridge", id = self.id, generation, len = buffer.len(), "consumer buffer attached");
        Ok(())
    }

    /// ### English
    /// Tears the consumer link down: closes the queue and suppresses wakes. Returns the number of
    /// items discarded.
    ///
    /// The frame handoff is left as is. The decoder may still be writing through pointers from
    /// `lock_for_write`, so the scratch buffer stays allocated until the decoder's own `cleanup`
    /// or until the last `Arc<VideoBridge>` is dropped.
    ///
    /// ### 中文
    /// 断开与消费者的连接：关闭队列并抑制唤醒。返回被丢弃的条目数量。
    ///
    /// 帧交接状态保持不变。解码器可能仍在通过 `lock_for_write` 得到的指针写入，因此 scratch
    /// 缓冲会一直保留，直到解码器自己调用 `cleanup` 或最后一个 `Arc<VideoBridge>` 被 drop。
    pub(crate) fn close(&self) -> usize {
        self.wake.close();
        let discarded = self.shared.lock().queue.close();
        let count = discarded.len();
        drop(discarded);
        debug!(target: "vmem_bridge", id = self.id, discarded = count, "bridge closed");
        count
    }
}

impl DecoderCallbacks for VideoBridge {
    fn negotiate(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Option<Arc<FrameBufferDescriptor>>> {
        let negotiated = match self.negotiator.negotiate(width, height, format) {
            Ok(Some(negotiated)) => negotiated,
            Ok(None) => {
                trace!(target: "vmem_bridge", id = self.id, width, height, "zero geometry; negotiation skipped");
                return Ok(None);
            }
            Err(err) => {
                error!(target: "vmem_bridge", id = self.id, width, height, %err, "format negotiation failed");
                return Err(err);
            }
        };

        let descriptor = negotiated.descriptor.clone();
        let (accepted, retired) = {
            let mut shared = self.shared.lock();
            let retired = shared
                .handoff
                .install(negotiated.descriptor, negotiated.scratch);
            let accepted = shared.queue.push(WorkItem::FormatSetup {
                descriptor: descriptor.clone(),
            });
            (accepted, retired)
        };
        self.after_push(accepted, "format_setup");
        drop(retired);

        debug!(
            target: "vmem_bridge",
            id = self.id,
            generation = descriptor.generation(),
            width,
            height,
            format = format.as_str(),
            total_size = descriptor.total_size(),
            "frame buffer negotiated"
        );
        Ok(Some(descriptor))
    }

    fn lock_for_write(&self) -> Result<PlanePointers> {
        let planes = self.shared.lock().handoff.lock_for_write();
        if let Err(err) = &planes {
            trace!(target: "vmem_bridge", id = self.id, %err, "lock without frame buffer");
        }
        planes
    }

    fn unlock_after_write(&self) {}

    fn display_ready(&self) {
        let accepted = {
            let mut shared = self.shared.lock();
            let frame = shared.handoff.take_written();
            shared.queue.push(WorkItem::FrameReady { frame })
        };
        self.after_push(accepted, "frame_ready");
    }

    fn cleanup(&self) {
        let (accepted, retired) = {
            let mut shared = self.shared.lock();
            let retired = shared.handoff.cleanup();
            let accepted = shared.queue.push(WorkItem::FrameCleanup);
            (accepted, retired)
        };
        self.after_push(accepted, "frame_cleanup");
        drop(retired);
        debug!(target: "vmem_bridge", id = self.id, "frame buffers cleaned up");
    }

    fn on_event(&self, event: &NativeEvent) {
        match events::translate(event) {
            Some(event) => self.enqueue(WorkItem::PlayerEvent(event)),
            None => trace!(target: "vmem_bridge", id = self.id, ?event, "unmapped player event dropped"),
        }
    }
}

impl Drop for VideoBridge {
    fn drop(&mut self) {
        let remaining = self.shared.get_mut().queue.len();
        if remaining != 0 {
            warn!(target: "vmem_bridge", id = self.id, remaining, "bridge dropped with undrained work");
        }
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::BridgeError;
    use crate::engine::frame::FrameSource;

    fn bridge() -> VideoBridge {
        VideoBridge::new(
            1,
            &BridgeConfig::default(),
            None,
            Arc::new(AtomicUsize::new(0)),
        )
    }

    fn drain(bridge: &VideoBridge) -> Vec<WorkItem> {
        let mut local = Vec::new();
        bridge.swap_pending(&mut local);
        local
    }

    #[test]
    fn zero_geometry_queues_nothing() {
        let bridge = bridge();
        assert!(bridge.negotiate(0, 480, PixelFormat::Planar420).unwrap().is_none());
        assert_eq!(bridge.pending_len(), 0);
        assert_eq!(bridge.ownership(), BufferOwnership::NoBuffer);
        assert_eq!(bridge.wakes_issued(), 0);
    }

    #[test]
    fn lock_before_negotiation_reports_no_buffer() {
        let bridge = bridge();
        assert_eq!(bridge.lock_for_write().unwrap_err(), BridgeError::NoBuffer);
        bridge.display_ready();
        let items = drain(&bridge);
        assert!(matches!(items.as_slice(), [WorkItem::FrameReady { frame: None }]));
    }

    #[test]
    fn frame_cycle_queues_setup_then_ready() {
        let bridge = bridge();
        bridge.negotiate(64, 48, PixelFormat::Planar420).unwrap();
        bridge.lock_for_write().unwrap();
        bridge.unlock_after_write();
        bridge.display_ready();

        let items = drain(&bridge);
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], WorkItem::FormatSetup { .. }));
        match &items[1] {
            WorkItem::FrameReady { frame: Some(frame) } => {
                assert_eq!(frame.source(), FrameSource::Scratch)
            }
            _ => panic!("expected FrameReady with a frame"),
        }
        assert_eq!(bridge.wakes_issued(), 1);
    }

    #[test]
    fn unmapped_events_are_not_queued() {
        let bridge = bridge();
        bridge.on_event(&NativeEvent::SnapshotTaken);
        assert_eq!(bridge.pending_len(), 0);
        bridge.on_event(&NativeEvent::Playing);
        assert_eq!(bridge.pending_len(), 1);
    }

    #[test]
    fn close_discards_and_rejects_further_work() {
        let bridge = bridge();
        bridge.negotiate(16, 16, PixelFormat::Packed32).unwrap();
        assert_eq!(bridge.close(), 1);

        bridge.display_ready();
        assert_eq!(bridge.pending_len(), 0);
        assert_eq!(bridge.wakes_issued(), 1);
    }

    #[test]
    fn close_keeps_scratch_for_write_in_flight() {
        let bridge = bridge();
        let descriptor = bridge
            .negotiate(32, 16, PixelFormat::Planar420)
            .unwrap()
            .unwrap();
        let planes = bridge.lock_for_write().unwrap();

        bridge.close();
        assert_eq!(bridge.ownership(), BufferOwnership::ScratchOnly);
        assert_eq!(bridge.descriptor().as_deref(), Some(&*descriptor));

        let base = planes.get(0).unwrap();
        let frame = unsafe { std::slice::from_raw_parts_mut(base, descriptor.total_size()) };
        frame.fill(0xAB);
        assert!(frame.iter().all(|&byte| byte == 0xAB));

        bridge.unlock_after_write();
        bridge.display_ready();
        assert_eq!(bridge.pending_len(), 0);

        bridge.cleanup();
        assert_eq!(bridge.ownership(), BufferOwnership::NoBuffer);
        assert_eq!(bridge.pending_len(), 0);
    }

    #[test]
    fn pixel_format_is_switchable() {
        let bridge = bridge();
        assert_eq!(bridge.pixel_format(), PixelFormat::Planar420);
        bridge.set_pixel_format(PixelFormat::Packed32);
        assert_eq!(bridge.pixel_format(), PixelFormat::Packed32);
    }
}
