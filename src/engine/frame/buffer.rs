//! ### English
//! Frame memory: the bridge-owned scratch buffer, the consumer-owned buffer reference, and the
//! write target captured for each frame.
//!
//! Both buffers are written by the decoder through raw plane pointers while other threads may hold
//! references to them, so neither is stored as a `Box<[u8]>`/`&mut [u8]` (those would assert
//! unique access). Reads on the consumer side go through [`FrameRef`].
//!
//! ### 中文
//! 帧内存：bridge 持有的 scratch 缓冲、消费者持有的缓冲引用，以及每帧捕获的写入目标。
//!
//! 两种缓冲都由解码器通过原始平面指针写入，同时其它线程可能持有它们的引用，因此都不以
//! `Box<[u8]>`/`&mut [u8]` 形式保存（那会声明独占访问）。消费者侧通过 [`FrameRef`] 读取。

use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use crate::engine::error::{BridgeError, Result};

use super::layout::{FrameBufferDescriptor, MAX_PLANES};

/// ### English
/// Bridge-owned fallback buffer the decoder writes into until the consumer attaches its own.
///
/// Shared through `Arc`: the bridge drops its reference on attach/cleanup, while a write in flight
/// or a queued `FrameReady` keeps the memory alive until it is done with it.
///
/// ### 中文
/// bridge 持有的兜底缓冲：在消费者 attach 自己的缓冲之前，解码器写入这里。
///
/// 通过 `Arc` 共享：bridge 在 attach/cleanup 时释放自身引用，而进行中的写入或已入队的
/// `FrameReady` 会让内存保持存活直到用完。
pub(crate) struct ScratchBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

unsafe impl Send for ScratchBuffer {}
unsafe impl Sync for ScratchBuffer {}

impl ScratchBuffer {
    /// ### English
    /// Allocates a zeroed buffer of exactly `len` bytes.
    ///
    /// Allocation failure is reported as [`BridgeError::ScratchAllocation`] instead of aborting.
    ///
    /// ### 中文
    /// 分配恰好 `len` 字节、已清零的缓冲。
    ///
    /// 分配失败时返回 [`BridgeError::ScratchAllocation`]，而不是直接 abort。
    pub(crate) fn allocate(len: usize) -> Result<Self> {
        let mut bytes: Vec<u8> = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| BridgeError::ScratchAllocation { size: len })?;
        bytes.resize(len, 0);

        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        let ptr = NonNull::from(Box::leak(boxed)).cast::<u8>();
        Ok(Self { ptr, len })
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchBuffer").field("len", &self.len()).finish()
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        unsafe {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.len,
            )));
        }
    }
}

/// ### English
/// Non-owning reference to a buffer supplied by the consumer in response to `FrameSetup`.
///
/// The bridge never frees it. The consumer must keep the memory valid until it receives
/// `FrameCleanup`, a newer `FrameSetup`, or tears the bridge down.
///
/// ### 中文
/// 对消费者在响应 `FrameSetup` 时提供的缓冲的非持有引用。
///
/// bridge 从不释放它。消费者必须保证该内存在收到 `FrameCleanup`、更新的 `FrameSetup`
/// 或销毁 bridge 之前一直有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

unsafe impl Send for ConsumerBuffer {}
unsafe impl Sync for ConsumerBuffer {}

impl ConsumerBuffer {
    /// ### English
    /// Wraps a consumer-owned region. Returns `None` for a null pointer.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` bytes from the decoder's video thread and
    /// the consumer thread for as long as the buffer stays attached.
    ///
    /// ### 中文
    /// 包装一段消费者持有的内存；空指针返回 `None`。
    ///
    /// # Safety
    /// 在缓冲保持 attach 期间，`ptr` 必须对解码器视频线程与消费者线程的 `len` 字节读写都有效。
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, len })
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// ### English
/// Which buffer holds a frame.
///
/// ### 中文
/// 帧所在的缓冲类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    Scratch,
    Consumer,
}

#[derive(Clone)]
pub(crate) enum BufferRef {
    Scratch(Arc<ScratchBuffer>),
    Consumer(ConsumerBuffer),
}

impl BufferRef {
    #[inline]
    fn base_ptr(&self) -> *mut u8 {
        match self {
            Self::Scratch(scratch) => scratch.as_ptr(),
            Self::Consumer(consumer) => consumer.as_ptr(),
        }
    }

    #[inline]
    fn source(&self) -> FrameSource {
        match self {
            Self::Scratch(_) => FrameSource::Scratch,
            Self::Consumer(_) => FrameSource::Consumer,
        }
    }
}

/// ### English
/// Buffer + layout selected for one write. Fixed at `lock_for_write` time and carried by the
/// matching `FrameReady`, so later attaches never redirect a frame already in progress.
///
/// ### 中文
/// 一次写入所选定的缓冲 + 布局。在 `lock_for_write` 时确定并随对应的 `FrameReady` 传递，
/// 因此之后的 attach 不会改变已在进行中的帧。
#[derive(Clone)]
pub(crate) struct WriteTarget {
    buffer: BufferRef,
    descriptor: Arc<FrameBufferDescriptor>,
}

impl WriteTarget {
    pub(crate) fn new(buffer: BufferRef, descriptor: Arc<FrameBufferDescriptor>) -> Self {
        Self { buffer, descriptor }
    }

    /// Plane start pointers: the base pointer plus each plane's offset.
    pub(crate) fn planes(&self) -> PlanePointers {
        let base = self.buffer.base_ptr();
        let mut planes = [ptr::null_mut(); MAX_PLANES];
        let count = self.descriptor.plane_count();
        for (index, plane) in planes.iter_mut().enumerate().take(count) {
            let offset = self.descriptor.plane_offset(index).unwrap_or(0);
            *plane = base.wrapping_add(offset);
        }
        PlanePointers { planes, count }
    }

    #[inline]
    pub(crate) fn source(&self) -> FrameSource {
        self.buffer.source()
    }
}

/// ### English
/// Plane pointers handed to the decoder for one write.
///
/// ### 中文
/// 一次写入交给解码器的平面指针。
#[derive(Debug, Clone, Copy)]
pub struct PlanePointers {
    planes: [*mut u8; MAX_PLANES],
    count: usize,
}

impl PlanePointers {
    #[inline]
    pub fn as_slice(&self) -> &[*mut u8] {
        &self.planes[..self.count]
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<*mut u8> {
        self.as_slice().get(index).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// ### English
/// Borrowed view of a finished frame, delivered to the `FrameReady` handler.
///
/// The underlying buffer is reused for the next frame, so the contents are only meaningful until
/// the next `FrameReady`; copy out anything that must persist before returning from the handler.
///
/// ### 中文
/// 已完成帧的借用视图，交给 `FrameReady` 处理函数。
///
/// 底层缓冲会被下一帧复用，因此内容只在下一次 `FrameReady` 之前有意义；需要持久保存的数据
/// 应在处理函数返回前拷出。
#[derive(Clone, Copy)]
pub struct FrameRef<'a> {
    target: &'a WriteTarget,
}

impl<'a> FrameRef<'a> {
    pub(crate) fn new(target: &'a WriteTarget) -> Self {
        Self { target }
    }

    /// ### English
    /// Whether the frame lives in the scratch buffer or in the consumer's own buffer.
    ///
    /// ### 中文
    /// 帧位于 scratch 缓冲还是消费者自己的缓冲。
    #[inline]
    pub fn source(&self) -> FrameSource {
        self.target.source()
    }

    #[inline]
    pub fn descriptor(&self) -> &'a FrameBufferDescriptor {
        &self.target.descriptor
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.target.buffer.base_ptr()
    }

    /// ### English
    /// Number of frame bytes (`total_size` of the layout the frame was written with).
    ///
    /// ### 中文
    /// 帧字节数（写入该帧时所用布局的 `total_size`）。
    #[inline]
    pub fn len(&self) -> usize {
        self.target.descriptor.total_size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// ### English
    /// Views the whole frame as bytes.
    ///
    /// # Safety
    /// The decoder must not be writing the next frame into the same buffer while the slice is
    /// alive; for a consumer buffer, the memory must still be valid.
    ///
    /// ### 中文
    /// 以字节切片查看整帧。
    ///
    /// # Safety
    /// 切片存活期间解码器不得向同一缓冲写入下一帧；若为消费者缓冲，其内存必须仍然有效。
    pub unsafe fn as_slice(&self) -> &'a [u8] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    /// ### English
    /// Views plane `index` (from its offset up to the next plane or the end of the frame).
    ///
    /// # Safety
    /// Same requirements as [`Self::as_slice`].
    ///
    /// ### 中文
    /// 查看平面 `index`（从其偏移到下一个平面或帧末尾）。
    ///
    /// # Safety
    /// 与 [`Self::as_slice`] 相同。
    pub unsafe fn plane(&self, index: usize) -> Option<&'a [u8]> {
        let descriptor = self.descriptor();
        let start = descriptor.plane_offset(index)?;
        let end = descriptor
            .plane_offset(index + 1)
            .unwrap_or(descriptor.total_size());
        let frame = unsafe { self.as_slice() };
        frame.get(start..end)
    }
}
