//! ### English
//! Zero-copy frame handoff: buffer-ownership state machine shared by the decoder's video thread
//! and the consumer's drain loop.
//!
//! States:
//! - `NoBuffer`: nothing negotiated yet, or cleaned up.
//! - `ScratchOnly`: the decoder writes into the bridge-owned scratch buffer.
//! - `ConsumerAttached`: the decoder writes straight into the consumer's buffer.
//!
//! Transitions happen only in `install` (negotiation), `cleanup`, and `attach` (drain time).
//! The caller holds the bridge lock around every method here.
//!
//! ### 中文
//! 零拷贝帧交接：由解码器视频线程与消费者 drain 循环共享的缓冲所有权状态机。
//!
//! 状态：
//! - `NoBuffer`：尚未协商，或已 cleanup。
//! - `ScratchOnly`：解码器写入 bridge 持有的 scratch 缓冲。
//! - `ConsumerAttached`：解码器直接写入消费者的缓冲。
//!
//! 状态转换只发生在 `install`（协商）、`cleanup` 与 `attach`（drain 时）中。
//! 调用方在调用本文件的每个方法时都持有 bridge 锁。

use std::sync::Arc;

use crate::engine::error::{BridgeError, Result};

use super::buffer::{BufferRef, ConsumerBuffer, PlanePointers, ScratchBuffer, WriteTarget};
use super::layout::FrameBufferDescriptor;

/// ### English
/// Observable buffer-ownership state.
///
/// ### 中文
/// 可观察的缓冲所有权状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOwnership {
    NoBuffer,
    ScratchOnly,
    ConsumerAttached,
}

#[derive(Default)]
pub(crate) struct FrameHandoff {
    /// ### English
    /// Current descriptor (at most one valid instance).
    ///
    /// ### 中文
    /// 当前描述（最多一个有效实例）。
    descriptor: Option<Arc<FrameBufferDescriptor>>,
    /// ### English
    /// Bridge reference to the scratch buffer; `Some` iff no consumer buffer is attached.
    ///
    /// ### 中文
    /// bridge 对 scratch 缓冲的引用；当且仅当没有 attach 消费者缓冲时为 `Some`。
    scratch: Option<Arc<ScratchBuffer>>,
    consumer: Option<ConsumerBuffer>,
    /// ### English
    /// Target chosen by the most recent `lock_for_write`, consumed by `display_ready`.
    ///
    /// ### 中文
    /// 最近一次 `lock_for_write` 选定的目标，由 `display_ready` 取走。
    last_write: Option<WriteTarget>,
}

impl FrameHandoff {
    pub(crate) fn ownership(&self) -> BufferOwnership {
        if self.consumer.is_some() {
            BufferOwnership::ConsumerAttached
        } else if self.scratch.is_some() {
            BufferOwnership::ScratchOnly
        } else {
            BufferOwnership::NoBuffer
        }
    }

    pub(crate) fn descriptor(&self) -> Option<&Arc<FrameBufferDescriptor>> {
        self.descriptor.as_ref()
    }

    /// ### English
    /// Publishes a freshly negotiated descriptor and scratch buffer (`* -> ScratchOnly`).
    ///
    /// Any attached consumer buffer is detached since it was sized for the previous layout.
    /// Returns the previous scratch reference so the caller can drop it outside the lock.
    ///
    /// ### 中文
    /// 发布新协商得到的描述与 scratch 缓冲（`* -> ScratchOnly`）。
    ///
    /// 已 attach 的消费者缓冲会被解除（它按旧布局分配）。返回旧的 scratch 引用，以便调用方在锁外释放。
    pub(crate) fn install(
        &mut self,
        descriptor: Arc<FrameBufferDescriptor>,
        scratch: Arc<ScratchBuffer>,
    ) -> Option<Arc<ScratchBuffer>> {
        self.descriptor = Some(descriptor);
        self.consumer = None;
        self.last_write = None;
        self.scratch.replace(scratch)
    }

    /// ### English
    /// Releases everything (`* -> NoBuffer`). Returns the scratch reference to drop outside the lock.
    ///
    /// ### 中文
    /// 释放全部状态（`* -> NoBuffer`）。返回 scratch 引用以便在锁外释放。
    pub(crate) fn cleanup(&mut self) -> Option<Arc<ScratchBuffer>> {
        self.descriptor = None;
        self.consumer = None;
        self.last_write = None;
        self.scratch.take()
    }

    /// ### English
    /// Attaches the consumer's buffer (`ScratchOnly -> ConsumerAttached`). Drain time only.
    ///
    /// Rejected with [`BridgeError::StaleSetup`] when `generation` is not the current descriptor's,
    /// and with [`BridgeError::BufferTooSmall`] when the buffer cannot hold a frame. On success the
    /// bridge's scratch reference is returned for the caller to drop outside the lock.
    ///
    /// ### 中文
    /// attach 消费者缓冲（`ScratchOnly -> ConsumerAttached`），仅在 drain 时调用。
    ///
    /// 若 `generation` 不是当前描述的 generation，返回 [`BridgeError::StaleSetup`]；若缓冲装不下一帧，
    /// 返回 [`BridgeError::BufferTooSmall`]。成功时返回 bridge 的 scratch 引用，由调用方在锁外释放。
    pub(crate) fn attach(
        &mut self,
        generation: u64,
        buffer: ConsumerBuffer,
    ) -> Result<Option<Arc<ScratchBuffer>>> {
        let current = self.descriptor.as_ref().map(|d| d.generation());
        let descriptor = match &self.descriptor {
            Some(descriptor) if descriptor.generation() == generation => descriptor,
            _ => {
                return Err(BridgeError::StaleSetup {
                    offered: generation,
                    current,
                });
            }
        };

        if buffer.len() < descriptor.total_size() {
            return Err(BridgeError::BufferTooSmall {
                required: descriptor.total_size(),
                provided: buffer.len(),
            });
        }

        self.consumer = Some(buffer);
        Ok(self.scratch.take())
    }

    fn current_target(&self) -> Option<WriteTarget> {
        let descriptor = self.descriptor.clone()?;
        let buffer = match (&self.consumer, &self.scratch) {
            (Some(consumer), _) => BufferRef::Consumer(*consumer),
            (None, Some(scratch)) => BufferRef::Scratch(scratch.clone()),
            (None, None) => return None,
        };
        Some(WriteTarget::new(buffer, descriptor))
    }

    /// ### English
    /// Selects the buffer for the next write and returns its plane pointers.
    ///
    /// The selection is remembered until `display_ready`, so an attach in between does not change
    /// which buffer the finished frame is reported from.
    ///
    /// ### 中文
    /// 为下一次写入选择缓冲并返回平面指针。
    ///
    /// 选择结果会保留到 `display_ready`，因此期间发生的 attach 不会改变该帧被报告所在的缓冲。
    pub(crate) fn lock_for_write(&mut self) -> Result<PlanePointers> {
        let target = self.current_target().ok_or(BridgeError::NoBuffer)?;
        let planes = target.planes();
        self.last_write = Some(target);
        Ok(planes)
    }

    /// ### English
    /// Takes the target of the last write (falls back to the current buffer if nothing was locked).
    ///
    /// ### 中文
    /// 取出最近一次写入的目标（若没有 lock 过，则回退为当前缓冲）。
    pub(crate) fn take_written(&mut self) -> Option<WriteTarget> {
        self.last_write.take().or_else(|| self.current_target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::frame::buffer::FrameSource;
    use crate::engine::frame::layout::PixelFormat;
    use crate::engine::frame::negotiator::Negotiator;

    fn negotiated(handoff: &mut FrameHandoff, negotiator: &Negotiator, w: u32, h: u32) -> u64 {
        let negotiated = negotiator
            .negotiate(w, h, PixelFormat::Planar420)
            .unwrap()
            .unwrap();
        let generation = negotiated.descriptor.generation();
        handoff.install(negotiated.descriptor, negotiated.scratch);
        generation
    }

    #[test]
    fn starts_without_buffer() {
        let mut handoff = FrameHandoff::default();
        assert_eq!(handoff.ownership(), BufferOwnership::NoBuffer);
        assert_eq!(handoff.lock_for_write().unwrap_err(), BridgeError::NoBuffer);
        assert!(handoff.take_written().is_none());
    }

    #[test]
    fn lock_points_into_scratch_planes() {
        let negotiator = Negotiator::new();
        let mut handoff = FrameHandoff::default();
        negotiated(&mut handoff, &negotiator, 640, 480);
        assert_eq!(handoff.ownership(), BufferOwnership::ScratchOnly);

        let planes = handoff.lock_for_write().unwrap();
        assert_eq!(planes.len(), 3);
        let base = planes.get(0).unwrap() as usize;
        assert_eq!(planes.get(1).unwrap() as usize - base, 307_200);
        assert_eq!(planes.get(2).unwrap() as usize - base, 384_000);

        let written = handoff.take_written().unwrap();
        assert_eq!(written.source(), FrameSource::Scratch);
    }

    #[test]
    fn attach_switches_next_lock_to_consumer_buffer() {
        let negotiator = Negotiator::new();
        let mut handoff = FrameHandoff::default();
        let generation = negotiated(&mut handoff, &negotiator, 64, 32);
        let total = handoff.descriptor().unwrap().total_size();

        let in_flight = handoff.lock_for_write().unwrap();

        let mut storage = vec![0u8; total];
        let consumer = unsafe { ConsumerBuffer::from_raw_parts(storage.as_mut_ptr(), total) }.unwrap();
        let released = handoff.attach(generation, consumer).unwrap();
        assert!(released.is_some());
        assert_eq!(handoff.ownership(), BufferOwnership::ConsumerAttached);

        // The in-flight write still resolves to the scratch buffer.
        let written = handoff.take_written().unwrap();
        assert_eq!(written.source(), FrameSource::Scratch);
        assert_eq!(written.planes().get(0), in_flight.get(0));
        drop(released);

        let next = handoff.lock_for_write().unwrap();
        assert_eq!(next.get(0), Some(storage.as_mut_ptr()));
        assert_eq!(
            handoff.take_written().unwrap().source(),
            FrameSource::Consumer
        );
    }

    #[test]
    fn attach_rejects_stale_and_small_buffers() {
        let negotiator = Negotiator::new();
        let mut handoff = FrameHandoff::default();
        let old = negotiated(&mut handoff, &negotiator, 64, 32);
        let current = negotiated(&mut handoff, &negotiator, 128, 64);
        let total = handoff.descriptor().unwrap().total_size();

        let mut storage = vec![0u8; total];
        let small = unsafe { ConsumerBuffer::from_raw_parts(storage.as_mut_ptr(), total - 1) }.unwrap();
        let full = unsafe { ConsumerBuffer::from_raw_parts(storage.as_mut_ptr(), total) }.unwrap();

        assert_eq!(
            handoff.attach(old, full).unwrap_err(),
            BridgeError::StaleSetup {
                offered: old,
                current: Some(current)
            }
        );
        assert_eq!(
            handoff.attach(current, small).unwrap_err(),
            BridgeError::BufferTooSmall {
                required: total,
                provided: total - 1
            }
        );
        assert_eq!(handoff.ownership(), BufferOwnership::ScratchOnly);
    }

    #[test]
    fn renegotiation_detaches_consumer_and_cleanup_clears_everything() {
        let negotiator = Negotiator::new();
        let mut handoff = FrameHandoff::default();
        let generation = negotiated(&mut handoff, &negotiator, 16, 16);
        let total = handoff.descriptor().unwrap().total_size();
        let mut storage = vec![0u8; total];
        let consumer = unsafe { ConsumerBuffer::from_raw_parts(storage.as_mut_ptr(), total) }.unwrap();
        handoff.attach(generation, consumer).unwrap();

        negotiated(&mut handoff, &negotiator, 32, 32);
        assert_eq!(handoff.ownership(), BufferOwnership::ScratchOnly);

        assert!(handoff.cleanup().is_some());
        assert_eq!(handoff.ownership(), BufferOwnership::NoBuffer);
        assert!(handoff.descriptor().is_none());
        assert_eq!(
            handoff.attach(generation, consumer).unwrap_err(),
            BridgeError::StaleSetup {
                offered: generation,
                current: None
            }
        );
    }
}
