//! ### English
//! Work items carried from producer threads to the consumer thread.
//!
//! ### 中文
//! 从生产者线程传递到消费者线程的工作条目。

use std::sync::Arc;

use crate::engine::events::PlayerEvent;
use crate::engine::frame::{FrameBufferDescriptor, WriteTarget};

/// ### English
/// One unit of cross-thread work. Items are processed on the consumer thread in enqueue order.
///
/// ### 中文
/// 一个跨线程工作单元。消费者线程按入队顺序处理。
pub(crate) enum WorkItem {
    /// ### English
    /// A new frame layout was negotiated; the consumer may answer with its own buffer.
    ///
    /// ### 中文
    /// 协商出了新的帧布局；消费者可以提供自己的缓冲作为回应。
    FormatSetup {
        descriptor: Arc<FrameBufferDescriptor>,
    },
    /// ### English
    /// A frame finished decoding. `frame` is the buffer it was written into, captured at display
    /// time; `None` when no buffer existed.
    ///
    /// ### 中文
    /// 一帧解码完成。`frame` 是在 display 时捕获的写入缓冲；没有缓冲时为 `None`。
    FrameReady { frame: Option<WriteTarget> },
    /// ### English
    /// The decoder released its video output; consumer buffers may be freed after this.
    ///
    /// ### 中文
    /// 解码器释放了视频输出；此后消费者可以释放自己的缓冲。
    FrameCleanup,
    /// ### English
    /// Translated player event.
    ///
    /// ### 中文
    /// 已翻译的播放器事件。
    PlayerEvent(PlayerEvent),
}

impl WorkItem {
    /// Short label for logs.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::FormatSetup { .. } => "format_setup",
            Self::FrameReady { .. } => "frame_ready",
            Self::FrameCleanup => "frame_cleanup",
            Self::PlayerEvent(event) => event.kind().as_str(),
        }
    }
}
