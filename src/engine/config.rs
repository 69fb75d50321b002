//! ### English
//! Per-registry configuration applied to every bridge it creates.
//!
//! ### 中文
//! 注册表级配置，应用到其创建的每个 bridge。

use crate::engine::frame::PixelFormat;

/// ### English
/// Default initial capacity of each bridge's work queue.
///
/// ### 中文
/// 每个 bridge 工作队列的默认初始容量。
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// ### English
/// Bridge configuration.
///
/// ### 中文
/// bridge 配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// ### English
    /// Pixel format offered to the decoder at negotiation time (can be changed per bridge later).
    ///
    /// ### 中文
    /// 协商时提供给解码器的像素格式（之后可按 bridge 修改）。
    pub pixel_format: PixelFormat,
    /// ### English
    /// Initial capacity of the work queue. The queue still grows without bound.
    ///
    /// ### 中文
    /// 工作队列的初始容量；队列本身仍然无界增长。
    pub initial_queue_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::default(),
            initial_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl BridgeConfig {
    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_initial_queue_capacity(mut self, capacity: usize) -> Self {
        self.initial_queue_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_planar_420() {
        let config = BridgeConfig::default();
        assert_eq!(config.pixel_format, PixelFormat::Planar420);
        assert_eq!(config.initial_queue_capacity, DEFAULT_QUEUE_CAPACITY);

        let packed = config.with_pixel_format(PixelFormat::Packed32);
        assert_eq!(packed.pixel_format, PixelFormat::Packed32);
    }
}
