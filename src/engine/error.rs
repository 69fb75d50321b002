//! ### English
//! Error type shared by the negotiator, the handoff state machine and the C ABI.
//!
//! ### 中文
//! 协商器、交接状态机与 C ABI 共用的错误类型。

use thiserror::Error;

/// ### English
/// Errors reported by the bridge.
///
/// None of these are retried: allocation and overflow failures are fatal for the affected
/// negotiation, attach failures leave the current buffer in place.
///
/// ### 中文
/// bridge 上报的错误。
///
/// 所有错误都不会重试：分配与溢出失败对当次协商是致命的；attach 失败则保留当前缓冲。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("no frame buffer is available (format not negotiated or cleaned up)")]
    NoBuffer,

    #[error("failed to allocate {size} byte scratch buffer")]
    ScratchAllocation { size: usize },

    #[error("frame geometry {width}x{height} overflows the buffer layout")]
    GeometryOverflow { width: u32, height: u32 },

    #[error("consumer buffer too small: {provided} bytes provided, {required} required")]
    BufferTooSmall { required: usize, provided: usize },

    #[error("consumer buffer offered for setup generation {offered}, current is {current:?}")]
    StaleSetup { offered: u64, current: Option<u64> },
}

/// ### English
/// Convenience alias used across the crate.
///
/// ### 中文
/// crate 内通用的 `Result` 别名。
pub type Result<T> = std::result::Result<T, BridgeError>;
