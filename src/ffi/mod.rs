//! ### English
//! C ABI surface for `vmem_bridge`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//! Decoder-side entry points (`vmem_bridge_video_*_cb`, `vmem_bridge_event_cb`) match the decoder's
//! video-memory and event callback signatures and take the bridge handle as their opaque pointer.
//! Consumer-side entry points must all be called from the single consumer thread.
//!
//! ### 中文
//! `vmem_bridge` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//! 解码器侧入口（`vmem_bridge_video_*_cb`、`vmem_bridge_event_cb`）与解码器的视频内存回调及事件回调
//! 签名一致，并以 bridge 句柄作为 opaque 指针。消费者侧入口必须都在同一个消费者线程上调用。
mod abi;
mod bridge;
mod consumer;
mod events;
mod vmem;

use std::ffi::c_void;
use std::sync::Arc;

use crate::engine::events::{EventArg, PlayerEvent};
use crate::engine::frame::{FrameBufferDescriptor, FrameRef, FrameSource, MAX_PLANES};
use crate::engine::runtime::{BridgeConsumer, BridgeRegistry, VideoBridge};

/// ### English
/// Opaque registry handle. Bridges are created from it and share its configuration and live count.
///
/// ### 中文
/// 不透明注册表句柄。bridge 由它创建，并共享其配置与存活计数。
#[repr(C)]
pub struct VmemBridgeRegistry {
    registry: BridgeRegistry,
}

/// ### English
/// Opaque bridge handle: the producer half shared with decoder threads plus the consumer half
/// owned by the consumer thread.
///
/// ### 中文
/// 不透明 bridge 句柄：与解码器线程共享的生产者部分，以及由消费者线程持有的消费者部分。
#[repr(C)]
pub struct VmemBridge {
    /// ### English
    /// Producer handle; the only part decoder callbacks touch.
    ///
    /// ### 中文
    /// 生产者句柄；解码器回调只访问这一部分。
    bridge: Arc<VideoBridge>,
    /// ### English
    /// Drain loop and handlers; consumer thread only.
    ///
    /// ### 中文
    /// drain 循环与处理函数；仅消费者线程使用。
    consumer: BridgeConsumer,
}

/// ### English
/// C ABI version for `vmem_bridge`.
///
/// ### 中文
/// `vmem_bridge` 的 C ABI 版本号。
const VMEM_BRIDGE_ABI_VERSION: u32 = 1;

/// ### English
/// Frame layout passed to the `frame_setup` callback.
///
/// ### 中文
/// 传给 `frame_setup` 回调的帧布局。
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VmemBridgeFrameSetup {
    /// ### English
    /// Layout generation; increases with every successful negotiation.
    ///
    /// ### 中文
    /// 布局 generation；每次成功协商递增。
    pub generation: u64,
    /// ### English
    /// `VMEM_BRIDGE_PIXEL_FORMAT_*` selector.
    ///
    /// ### 中文
    /// `VMEM_BRIDGE_PIXEL_FORMAT_*` 选择值。
    pub format: u32,
    pub width: u32,
    pub height: u32,
    pub plane_count: u32,
    /// ### English
    /// Bytes per row for each plane (unused entries are `0`).
    ///
    /// ### 中文
    /// 每个平面的行字节数（未使用项为 `0`）。
    pub pitches: [u32; MAX_PLANES],
    pub lines: [u32; MAX_PLANES],
    /// ### English
    /// Start offset of each plane (unused entries are `0`).
    ///
    /// ### 中文
    /// 每个平面的起始偏移（未使用项为 `0`）。
    pub plane_offsets: [usize; MAX_PLANES],
    /// ### English
    /// Minimum size of a consumer-supplied buffer.
    ///
    /// ### 中文
    /// 消费者提供缓冲的最小字节数。
    pub total_size: usize,
}

impl From<&FrameBufferDescriptor> for VmemBridgeFrameSetup {
    fn from(value: &FrameBufferDescriptor) -> Self {
        let mut pitches = [0; MAX_PLANES];
        let mut lines = [0; MAX_PLANES];
        let mut plane_offsets = [0; MAX_PLANES];
        for index in 0..value.plane_count() {
            pitches[index] = value.pitches()[index];
            lines[index] = value.line_counts()[index];
            plane_offsets[index] = value.plane_offset(index).unwrap_or(0);
        }
        Self {
            generation: value.generation(),
            format: value.format().as_abi(),
            width: value.width(),
            height: value.height(),
            plane_count: value.plane_count() as u32,
            pitches,
            lines,
            plane_offsets,
            total_size: value.total_size(),
        }
    }
}

/// ### English
/// Buffer returned by the `frame_setup` callback. A NULL `data` keeps decoding into scratch.
///
/// ### 中文
/// `frame_setup` 回调返回的缓冲；`data` 为 NULL 时继续解码到 scratch。
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VmemBridgeBuffer {
    pub data: *mut u8,
    pub len: usize,
}

/// ### English
/// `FrameSource` as a C selector: the frame lives in the bridge's scratch buffer.
///
/// ### 中文
/// `FrameSource` 的 C 选择值：帧位于 bridge 的 scratch 缓冲。
pub const VMEM_BRIDGE_FRAME_SOURCE_SCRATCH: u32 = 0;
/// ### English
/// `FrameSource` as a C selector: the frame lives in the consumer's own buffer.
///
/// ### 中文
/// `FrameSource` 的 C 选择值：帧位于消费者自己的缓冲。
pub const VMEM_BRIDGE_FRAME_SOURCE_CONSUMER: u32 = 1;

/// ### English
/// Finished frame passed to the `frame_ready` callback (valid only during the call).
///
/// ### 中文
/// 传给 `frame_ready` 回调的已完成帧（仅在本次调用期间有效）。
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VmemBridgeFrame {
    pub data: *const u8,
    pub len: usize,
    pub generation: u64,
    /// ### English
    /// `VMEM_BRIDGE_FRAME_SOURCE_*`.
    ///
    /// ### 中文
    /// `VMEM_BRIDGE_FRAME_SOURCE_*`。
    pub source: u32,
}

impl From<FrameRef<'_>> for VmemBridgeFrame {
    fn from(value: FrameRef<'_>) -> Self {
        Self {
            data: value.as_ptr(),
            len: value.len(),
            generation: value.descriptor().generation(),
            source: match value.source() {
                FrameSource::Scratch => VMEM_BRIDGE_FRAME_SOURCE_SCRATCH,
                FrameSource::Consumer => VMEM_BRIDGE_FRAME_SOURCE_CONSUMER,
            },
        }
    }
}

pub const VMEM_BRIDGE_EVENT_ARG_NONE: u32 = 0;
pub const VMEM_BRIDGE_EVENT_ARG_NUMBER: u32 = 1;
pub const VMEM_BRIDGE_EVENT_ARG_BOOL: u32 = 2;

/// ### English
/// Translated player event passed to the `player_event` callback.
///
/// `kind` is the `PlayerEventKind` index; `arg_kind` selects which of `number`/`boolean` is set.
///
/// ### 中文
/// 传给 `player_event` 回调的已翻译播放器事件。
///
/// `kind` 为 `PlayerEventKind` 索引；`arg_kind` 指明 `number`/`boolean` 中哪个有效。
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VmemBridgeEvent {
    pub kind: u32,
    pub arg_kind: u32,
    pub number: f64,
    pub boolean: u8,
}

impl From<&PlayerEvent> for VmemBridgeEvent {
    fn from(value: &PlayerEvent) -> Self {
        let mut event = Self {
            kind: value.kind().index() as u32,
            arg_kind: VMEM_BRIDGE_EVENT_ARG_NONE,
            number: 0.0,
            boolean: 0,
        };
        match value.args().first() {
            Some(EventArg::Number(number)) => {
                event.arg_kind = VMEM_BRIDGE_EVENT_ARG_NUMBER;
                event.number = *number;
            }
            Some(EventArg::Bool(boolean)) => {
                event.arg_kind = VMEM_BRIDGE_EVENT_ARG_BOOL;
                event.boolean = u8::from(*boolean);
            }
            None => {}
        }
        event
    }
}

/// ### English
/// Consumer callback table. Every callback runs on the consumer thread inside
/// `vmem_bridge_drain`; NULL entries are skipped.
///
/// ### 中文
/// 消费者回调表。所有回调都在消费者线程的 `vmem_bridge_drain` 中运行；NULL 项会被跳过。
#[repr(C)]
#[derive(Clone, Copy)]
pub struct VmemBridgeCallbacks {
    pub user_data: *mut c_void,
    pub frame_setup: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            setup: *const VmemBridgeFrameSetup,
        ) -> VmemBridgeBuffer,
    >,
    /// ### English
    /// `frame` is NULL when a frame was displayed with no buffer in place.
    ///
    /// ### 中文
    /// 在没有缓冲时发生 display，`frame` 为 NULL。
    pub frame_ready:
        Option<unsafe extern "C" fn(user_data: *mut c_void, frame: *const VmemBridgeFrame)>,
    pub frame_cleanup: Option<unsafe extern "C" fn(user_data: *mut c_void)>,
    pub player_event:
        Option<unsafe extern "C" fn(user_data: *mut c_void, event: *const VmemBridgeEvent)>,
}
