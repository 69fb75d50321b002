//! ### English
//! Numeric constants passed through the C ABI.
//!
//! Pixel formats are passed as a `u32` selector; unknown values fall back to planar 4:2:0.
//!
//! ### 中文
//! 通过 C ABI 传递的数值常量。
//!
//! 像素格式以 `u32` 选择值传入；未知值回退为 4:2:0 平面格式。

/// ### English
/// Packed 32-bit layout (`RV32`): one plane, four bytes per pixel.
///
/// ### 中文
/// 32 位打包格式（`RV32`）：单平面，每像素 4 字节。
pub const VMEM_BRIDGE_PIXEL_FORMAT_RV32: u32 = 0;

/// ### English
/// Planar 4:2:0 layout (`I420`): Y, U, V planes; chroma planes are half size in each direction.
///
/// ### 中文
/// 4:2:0 平面格式（`I420`）：Y、U、V 三个平面；色度平面在两个方向上均为一半尺寸。
pub const VMEM_BRIDGE_PIXEL_FORMAT_I420: u32 = 1;

/// ### English
/// Number of picture buffers reported to the decoder on a successful format negotiation.
///
/// `0` tells the decoder that negotiation failed (or geometry is not known yet).
///
/// ### 中文
/// 格式协商成功时上报给解码器的图像缓冲数量。
///
/// `0` 表示协商失败（或尺寸尚未确定）。
pub const VMEM_BRIDGE_PICTURE_BUFFERS: u32 = 1;
