//! ### English
//! Frame buffer negotiation: layout computation plus scratch allocation.
//!
//! Runs on the decoder's video thread and must return before the decoder can continue, so it only
//! computes and allocates; publishing the result is left to the caller (under the bridge lock).
//!
//! ### 中文
//! 帧缓冲协商：布局计算 + scratch 分配。
//!
//! 运行在解码器视频线程上，解码器会阻塞等待其返回，因此这里只做计算与分配；结果的发布由调用方
//! （在 bridge 锁内）完成。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::error::Result;

use super::buffer::ScratchBuffer;
use super::layout::{FrameBufferDescriptor, PixelFormat};

/// ### English
/// Result of one successful negotiation: the new descriptor and a scratch buffer sized for it.
///
/// ### 中文
/// 一次成功协商的结果：新的描述以及与之匹配大小的 scratch 缓冲。
pub(crate) struct Negotiated {
    pub(crate) descriptor: Arc<FrameBufferDescriptor>,
    pub(crate) scratch: Arc<ScratchBuffer>,
}

/// ### English
/// Per-instance negotiator. Owns the generation counter stamped into each descriptor.
///
/// ### 中文
/// 每个实例一个的协商器，持有写入每个描述的 generation 计数。
pub(crate) struct Negotiator {
    generation: AtomicU64,
}

impl Negotiator {
    pub(crate) fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
        }
    }

    /// ### English
    /// Computes the layout and allocates the scratch buffer.
    ///
    /// Returns `Ok(None)` without touching the generation counter when `width` or `height` is zero.
    ///
    /// ### 中文
    /// 计算布局并分配 scratch 缓冲。
    ///
    /// 当 `width` 或 `height` 为 0 时返回 `Ok(None)`，且不改变 generation 计数。
    pub(crate) fn negotiate(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Option<Negotiated>> {
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let Some(descriptor) = FrameBufferDescriptor::compute(width, height, format, generation)?
        else {
            return Ok(None);
        };

        let scratch = ScratchBuffer::allocate(descriptor.total_size())?;
        Ok(Some(Negotiated {
            descriptor: Arc::new(descriptor),
            scratch: Arc::new(scratch),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_increase_per_successful_negotiation() {
        let negotiator = Negotiator::new();

        let first = negotiator
            .negotiate(320, 240, PixelFormat::Planar420)
            .unwrap()
            .unwrap();
        assert!(negotiator.negotiate(0, 240, PixelFormat::Planar420).unwrap().is_none());
        let second = negotiator
            .negotiate(640, 480, PixelFormat::Packed32)
            .unwrap()
            .unwrap();

        assert_eq!(first.descriptor.generation(), 1);
        assert_eq!(second.descriptor.generation(), 2);
        assert_eq!(first.scratch.len(), first.descriptor.total_size());
        assert_eq!(second.scratch.len(), 640 * 480 * 4);
    }
}
