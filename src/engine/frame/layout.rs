//! ### English
//! Plane layout arithmetic for the two supported pixel formats.
//!
//! Pure computation: no allocation, no shared state. The handoff state machine calls this from
//! the decoder's format callback, so it must stay cheap and bounded.
//!
//! ### 中文
//! 两种受支持像素格式的平面布局计算。
//!
//! 纯计算：不分配、不访问共享状态。交接状态机在解码器的格式回调中调用它，因此必须保持廉价且有界。

use dpi::PhysicalSize;

use crate::engine::error::{BridgeError, Result};
use crate::engine::flags;

/// ### English
/// Maximum plane count across supported formats (planar 4:2:0 has three).
///
/// ### 中文
/// 受支持格式中的最大平面数（4:2:0 平面格式为 3）。
pub const MAX_PLANES: usize = 3;

/// ### English
/// Pixel layout requested from the decoder.
///
/// ### 中文
/// 向解码器请求的像素布局。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PixelFormat {
    /// ### English
    /// Packed 32 bits per pixel, single plane (`RV32`).
    ///
    /// ### 中文
    /// 每像素 32 位打包，单平面（`RV32`）。
    Packed32 = 0,
    /// ### English
    /// Planar Y/U/V 4:2:0 (`I420`).
    ///
    /// ### 中文
    /// Y/U/V 4:2:0 平面格式（`I420`）。
    #[default]
    Planar420 = 1,
}

impl PixelFormat {
    /// ### English
    /// Decodes a C ABI selector (`VMEM_BRIDGE_PIXEL_FORMAT_*`); unknown values map to planar.
    ///
    /// ### 中文
    /// 解析 C ABI 选择值（`VMEM_BRIDGE_PIXEL_FORMAT_*`）；未知值映射为平面格式。
    pub fn from_abi(value: u32) -> Self {
        match value {
            flags::VMEM_BRIDGE_PIXEL_FORMAT_RV32 => Self::Packed32,
            _ => Self::Planar420,
        }
    }

    pub fn as_abi(self) -> u32 {
        match self {
            Self::Packed32 => flags::VMEM_BRIDGE_PIXEL_FORMAT_RV32,
            Self::Planar420 => flags::VMEM_BRIDGE_PIXEL_FORMAT_I420,
        }
    }

    /// ### English
    /// Four-character chroma code written back to the decoder.
    ///
    /// ### 中文
    /// 回写给解码器的四字符色度编码。
    pub fn fourcc(self) -> [u8; 4] {
        match self {
            Self::Packed32 => *b"RV32",
            Self::Planar420 => *b"I420",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Packed32 => "RV32",
            Self::Planar420 => "I420",
        }
    }

    pub fn plane_count(self) -> usize {
        match self {
            Self::Packed32 => 1,
            Self::Planar420 => MAX_PLANES,
        }
    }
}

/// Rounds up to the next multiple of 4.
#[inline]
pub(crate) fn align4(n: u32) -> Option<u32> {
    n.checked_add((4 - n % 4) % 4)
}

/// Rounds odd dimensions up by one.
#[inline]
fn even(n: u32) -> Option<u32> {
    n.checked_add(n & 1)
}

#[inline]
fn plane_bytes(pitch: u32, lines: u32) -> Option<usize> {
    (pitch as usize).checked_mul(lines as usize)
}

/// ### English
/// Immutable description of the frame buffer the decoder writes into.
///
/// A new descriptor is produced for every successful negotiation and replaces the previous one
/// wholesale; it is never mutated in place. `generation` identifies which negotiation produced it.
///
/// Plane `0` always starts at offset `0`; [`Self::plane_offsets`] lists the start offsets of the
/// remaining planes (empty for the packed format).
///
/// ### 中文
/// 解码器写入目标帧缓冲的不可变描述。
///
/// 每次成功协商都会生成新的描述并整体替换旧描述，从不原地修改；`generation` 标识产生它的那次协商。
///
/// 平面 `0` 总是从偏移 `0` 开始；[`Self::plane_offsets`] 列出其余平面的起始偏移（打包格式为空）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBufferDescriptor {
    generation: u64,
    format: PixelFormat,
    size: PhysicalSize<u32>,
    plane_count: usize,
    pitches: [u32; MAX_PLANES],
    line_counts: [u32; MAX_PLANES],
    offsets: [usize; MAX_PLANES],
    total_size: usize,
}

impl FrameBufferDescriptor {
    /// ### English
    /// Computes the layout for `width x height` in `format`.
    ///
    /// Returns `Ok(None)` when either dimension is zero (geometry not known yet), and
    /// [`BridgeError::GeometryOverflow`] if any pitch, offset or size does not fit.
    ///
    /// #### Parameters
    /// - `width` / `height`: Geometry requested by the decoder, in pixels.
    /// - `format`: Pixel format selected by configuration.
    /// - `generation`: Negotiation counter stamped into the descriptor.
    ///
    /// ### 中文
    /// 计算 `width x height` 在 `format` 下的布局。
    ///
    /// 任一维度为 0 时返回 `Ok(None)`（尺寸尚未确定）；若 pitch、偏移或总大小溢出，则返回
    /// [`BridgeError::GeometryOverflow`]。
    ///
    /// #### 参数
    /// - `width` / `height`：解码器请求的尺寸（像素）。
    /// - `format`：配置选择的像素格式。
    /// - `generation`：写入描述中的协商计数。
    pub fn compute(
        width: u32,
        height: u32,
        format: PixelFormat,
        generation: u64,
    ) -> Result<Option<Self>> {
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let overflow = BridgeError::GeometryOverflow { width, height };
        let size = PhysicalSize::new(width, height);

        let descriptor = match format {
            PixelFormat::Packed32 => Self::packed(size, generation),
            PixelFormat::Planar420 => Self::planar(size, generation),
        };
        descriptor.map(Some).ok_or(overflow)
    }

    fn packed(size: PhysicalSize<u32>, generation: u64) -> Option<Self> {
        let even_width = even(size.width)?;
        let even_height = even(size.height)?;

        let pitch = even_width.checked_mul(4)?;
        let total_size = plane_bytes(pitch, even_height)?;

        Some(Self {
            generation,
            format: PixelFormat::Packed32,
            size,
            plane_count: 1,
            pitches: [pitch, 0, 0],
            line_counts: [even_height, 0, 0],
            offsets: [0; MAX_PLANES],
            total_size,
        })
    }

    fn planar(size: PhysicalSize<u32>, generation: u64) -> Option<Self> {
        let even_width = even(size.width)?;
        let even_height = even(size.height)?;

        let luma_pitch = align4(even_width)?;
        let chroma_pitch = align4(even_width / 2)?;
        let luma_lines = even_height;
        let chroma_lines = even_height / 2;

        let u_offset = plane_bytes(luma_pitch, luma_lines)?;
        let chroma_bytes = plane_bytes(chroma_pitch, chroma_lines)?;
        let v_offset = u_offset.checked_add(chroma_bytes)?;
        let total_size = v_offset.checked_add(chroma_bytes)?;

        Some(Self {
            generation,
            format: PixelFormat::Planar420,
            size,
            plane_count: MAX_PLANES,
            pitches: [luma_pitch, chroma_pitch, chroma_pitch],
            line_counts: [luma_lines, chroma_lines, chroma_lines],
            offsets: [0, u_offset, v_offset],
            total_size,
        })
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// ### English
    /// Geometry as requested by the decoder (not rounded to even).
    ///
    /// ### 中文
    /// 解码器请求的原始尺寸（未取偶）。
    #[inline]
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    #[inline]
    pub fn plane_count(&self) -> usize {
        self.plane_count
    }

    /// ### English
    /// Per-plane row stride in bytes; always a multiple of 4.
    ///
    /// ### 中文
    /// 每个平面的行跨度（字节），总是 4 的倍数。
    #[inline]
    pub fn pitches(&self) -> &[u32] {
        &self.pitches[..self.plane_count]
    }

    #[inline]
    pub fn line_counts(&self) -> &[u32] {
        &self.line_counts[..self.plane_count]
    }

    /// ### English
    /// Start offsets of planes `1..`, strictly increasing. Empty for the packed format.
    ///
    /// ### 中文
    /// 平面 `1..` 的起始偏移，严格递增；打包格式为空。
    #[inline]
    pub fn plane_offsets(&self) -> &[usize] {
        &self.offsets[1..self.plane_count]
    }

    /// ### English
    /// Start offset of plane `index` (`0` for the first plane).
    ///
    /// ### 中文
    /// 平面 `index` 的起始偏移（第一个平面为 `0`）。
    #[inline]
    pub fn plane_offset(&self, index: usize) -> Option<usize> {
        (index < self.plane_count).then(|| self.offsets[index])
    }

    #[inline]
    pub fn total_size(&self) -> usize {
        self.total_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planar(width: u32, height: u32) -> FrameBufferDescriptor {
        match FrameBufferDescriptor::compute(width, height, PixelFormat::Planar420, 1) {
            Ok(Some(descriptor)) => descriptor,
            other => panic!("unexpected layout for {width}x{height}: {other:?}"),
        }
    }

    #[test]
    fn planar_vga_layout() {
        let d = planar(640, 480);
        assert_eq!(d.pitches(), &[640, 320, 320]);
        assert_eq!(d.line_counts(), &[480, 240, 240]);
        assert_eq!(d.plane_offsets(), &[307_200, 384_000]);
        assert_eq!(d.total_size(), 460_800);
        assert_eq!(d.width(), 640);
        assert_eq!(d.height(), 480);
    }

    #[test]
    fn planar_odd_geometry_rounds_up() {
        let d = planar(641, 481);
        assert_eq!(d.pitches(), &[644, 324, 324]);
        assert_eq!(d.line_counts(), &[482, 241, 241]);
        assert_eq!(d.plane_offsets(), &[310_408, 388_492]);
        assert_eq!(d.total_size(), 466_576);
        // The requested size is reported unchanged.
        assert_eq!(d.size(), PhysicalSize::new(641, 481));
    }

    #[test]
    fn planar_invariants_hold_for_small_geometries() {
        for width in 1..=67u32 {
            for height in 1..=35u32 {
                let d = planar(width, height);
                let even_width = width + (width & 1);
                let even_height = height + (height & 1);
                let pitch0 = align4(even_width).unwrap();
                let pitch1 = align4(even_width / 2).unwrap();

                assert_eq!(d.pitches(), &[pitch0, pitch1, pitch1]);
                assert!(d.pitches().iter().all(|p| p % 4 == 0));

                let offsets = d.plane_offsets();
                assert_eq!(offsets[0], (pitch0 * even_height) as usize);
                assert_eq!(
                    offsets[1],
                    offsets[0] + (pitch1 * (even_height / 2)) as usize
                );
                assert_eq!(
                    d.total_size(),
                    (pitch0 * even_height + 2 * pitch1 * (even_height / 2)) as usize
                );
                assert!(0 < offsets[0] && offsets[0] < offsets[1] && offsets[1] < d.total_size());
            }
        }
    }

    #[test]
    fn packed_layout_has_single_plane() {
        let d = FrameBufferDescriptor::compute(640, 480, PixelFormat::Packed32, 7)
            .unwrap()
            .unwrap();
        assert_eq!(d.format(), PixelFormat::Packed32);
        assert_eq!(d.plane_count(), 1);
        assert_eq!(d.pitches(), &[2560]);
        assert_eq!(d.line_counts(), &[480]);
        assert!(d.plane_offsets().is_empty());
        assert_eq!(d.total_size(), 1_228_800);
        assert_eq!(d.generation(), 7);

        let odd = FrameBufferDescriptor::compute(3, 3, PixelFormat::Packed32, 1)
            .unwrap()
            .unwrap();
        assert_eq!(odd.pitches(), &[16]);
        assert_eq!(odd.total_size(), 64);
    }

    #[test]
    fn zero_dimension_is_not_an_error() {
        for format in [PixelFormat::Packed32, PixelFormat::Planar420] {
            assert_eq!(FrameBufferDescriptor::compute(0, 480, format, 1), Ok(None));
            assert_eq!(FrameBufferDescriptor::compute(640, 0, format, 1), Ok(None));
        }
    }

    #[test]
    fn overflowing_geometry_is_rejected() {
        let err = FrameBufferDescriptor::compute(u32::MAX, 2, PixelFormat::Planar420, 1);
        assert_eq!(
            err,
            Err(BridgeError::GeometryOverflow {
                width: u32::MAX,
                height: 2
            })
        );
        assert!(FrameBufferDescriptor::compute(u32::MAX / 2, 2, PixelFormat::Packed32, 1).is_err());
    }

    #[test]
    fn abi_selector_round_trips_known_values() {
        assert_eq!(PixelFormat::from_abi(0), PixelFormat::Packed32);
        assert_eq!(PixelFormat::from_abi(1), PixelFormat::Planar420);
        assert_eq!(PixelFormat::from_abi(42), PixelFormat::Planar420);
        assert_eq!(PixelFormat::Packed32.fourcc(), *b"RV32");
        assert_eq!(PixelFormat::Planar420.as_abi(), 1);
    }
}
