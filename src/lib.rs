/// ### English
/// `vmem_bridge` crate root.
/// Exposes the C ABI via `ffi` and the Rust API via the re-exports below; the implementation
/// lives under `engine`.
///
/// ### 中文
/// `vmem_bridge` 的 crate 根。
/// 通过 `ffi` 导出 C ABI，通过下方的重导出提供 Rust API；实现位于 `engine` 模块。
mod engine;
mod ffi;

pub use engine::config::{BridgeConfig, DEFAULT_QUEUE_CAPACITY};
pub use engine::error::{BridgeError, Result};
pub use engine::events::{EventArg, NativeEvent, PlayerEvent, PlayerEventKind, translate};
pub use engine::flags;
pub use engine::frame::{
    BufferOwnership, ConsumerBuffer, FrameBufferDescriptor, FrameRef, FrameSource, MAX_PLANES,
    PixelFormat, PlanePointers,
};
pub use engine::runtime::{
    BridgeConsumer, BridgeRegistry, ChannelWaker, DecoderCallbacks, Handlers, ThreadWaker,
    VideoBridge, Waker, wake_channel,
};
