//! ### English
//! Decoder-facing callback surface. Every method runs on a decoder thread and must not call back
//! into consumer code.
//!
//! ### 中文
//! 面向解码器的回调接口。所有方法都在解码器线程上运行，且不得回调消费者代码。

use std::sync::Arc;

use crate::engine::error::Result;
use crate::engine::events::NativeEvent;
use crate::engine::frame::{FrameBufferDescriptor, PixelFormat, PlanePointers};

/// ### English
/// Callbacks the decoder invokes on its own threads.
///
/// ### 中文
/// 解码器在其自身线程上调用的回调。
pub trait DecoderCallbacks: Send + Sync {
    /// ### English
    /// Negotiates the frame layout for a new video geometry and allocates the scratch buffer.
    ///
    /// Returns `Ok(None)` when either dimension is zero (geometry not known yet); nothing is
    /// allocated or queued in that case. On success a `FormatSetup` item is queued.
    ///
    /// #### Parameters
    /// - `width`: Frame width in pixels.
    /// - `height`: Frame height in pixels.
    /// - `format`: Pixel format to lay the frame out in.
    ///
    /// ### 中文
    /// 为新的视频尺寸协商帧布局并分配 scratch 缓冲。
    ///
    /// 任一维度为 0（尺寸尚未确定）时返回 `Ok(None)`，此时不分配、不入队。成功时入队 `FormatSetup`。
    ///
    /// #### 参数
    /// - `width`：帧宽（像素）。
    /// - `height`：帧高（像素）。
    /// - `format`：帧布局使用的像素格式。
    fn negotiate(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Option<Arc<FrameBufferDescriptor>>>;

    /// ### English
    /// Returns plane pointers for the next frame write: the consumer buffer if attached, otherwise
    /// the scratch buffer. Fails with `NoBuffer` if nothing was negotiated.
    ///
    /// ### 中文
    /// 返回下一帧写入用的平面指针：已 attach 时为消费者缓冲，否则为 scratch 缓冲。
    /// 尚未协商时返回 `NoBuffer`。
    fn lock_for_write(&self) -> Result<PlanePointers>;

    fn unlock_after_write(&self);

    /// ### English
    /// Queues `FrameReady` for the frame just written.
    ///
    /// ### 中文
    /// 为刚写完的帧入队 `FrameReady`。
    fn display_ready(&self);

    /// ### English
    /// Releases the frame buffers and queues `FrameCleanup`.
    ///
    /// ### 中文
    /// 释放帧缓冲并入队 `FrameCleanup`。
    fn cleanup(&self);

    /// ### English
    /// Translates and queues a native player event; unmapped kinds are dropped.
    ///
    /// ### 中文
    /// 翻译并入队原生播放器事件；没有映射的类型会被丢弃。
    fn on_event(&self, event: &NativeEvent);
}
