//! ### English
//! Video-memory callbacks invoked by the decoder on its video output thread.
//!
//! Register them with the decoder's video callback API, passing the `VmemBridge` handle as the
//! opaque pointer.
//!
//! ### 中文
//! 解码器在其视频输出线程上调用的视频内存回调。
//!
//! 通过解码器的视频回调 API 注册，并以 `VmemBridge` 句柄作为 opaque 指针。

use std::ffi::{c_char, c_uint, c_void};
use std::ptr;
use std::sync::Arc;

use crate::engine::flags;
use crate::engine::runtime::{DecoderCallbacks, VideoBridge};

use super::VmemBridge;

/// ### English
/// Resolves the producer half of a bridge handle passed as the decoder's opaque pointer.
///
/// # Safety
/// `opaque` must be NULL or a live handle returned by `vmem_bridge_create`.
///
/// ### 中文
/// 从作为解码器 opaque 指针传入的 bridge 句柄中取出生产者部分。
///
/// # Safety
/// `opaque` 必须为 NULL，或是 `vmem_bridge_create` 返回且仍存活的句柄。
unsafe fn producer<'a>(opaque: *mut c_void) -> Option<&'a Arc<VideoBridge>> {
    let handle = opaque.cast::<VmemBridge>();
    if handle.is_null() {
        return None;
    }
    Some(unsafe { &(*handle).bridge })
}

#[unsafe(no_mangle)]
/// ### English
/// Format callback: negotiates the frame layout for the decoder's geometry.
///
/// Writes the fourcc into `chroma` and one pitch/line count per plane into `pitches`/`lines`.
/// Returns the number of picture buffers (`VMEM_BRIDGE_PICTURE_BUFFERS`) on success, or `0` when
/// the geometry is zero, the layout overflows, or the scratch buffer cannot be allocated.
///
/// #### Parameters
/// - `opaque`: Pointer to the bridge handle registered with the decoder.
/// - `chroma`: Four-byte chroma code (out).
/// - `width`/`height`: Frame geometry (in).
/// - `pitches`/`lines`: Per-plane arrays provided by the decoder (out).
///
/// ### 中文
/// 格式回调：为解码器的帧尺寸协商帧布局。
///
/// 把 fourcc 写入 `chroma`，并把每个平面的行字节数/行数写入 `pitches`/`lines`。
/// 成功时返回图像缓冲数量（`VMEM_BRIDGE_PICTURE_BUFFERS`）；尺寸为 0、布局溢出或 scratch 缓冲
/// 分配失败时返回 `0`。
///
/// #### 参数
/// - `opaque`：指向注册给解码器的 bridge 句柄的指针。
/// - `chroma`：4 字节色度代码（输出）。
/// - `width`/`height`：帧尺寸（输入）。
/// - `pitches`/`lines`：解码器提供的按平面数组（输出）。
pub unsafe extern "C" fn vmem_bridge_video_format_cb(
    opaque: *mut *mut c_void,
    chroma: *mut c_char,
    width: *mut c_uint,
    height: *mut c_uint,
    pitches: *mut c_uint,
    lines: *mut c_uint,
) -> c_uint {
    if opaque.is_null() || width.is_null() || height.is_null() {
        return 0;
    }
    let Some(bridge) = (unsafe { producer(*opaque) }) else {
        return 0;
    };
    let (width, height) = unsafe { (*width, *height) };

    let format = bridge.pixel_format();
    let descriptor = match bridge.negotiate(width, height, format) {
        Ok(Some(descriptor)) => descriptor,
        Ok(None) | Err(_) => return 0,
    };

    unsafe {
        if !chroma.is_null() {
            ptr::copy_nonoverlapping(format.fourcc().as_ptr().cast::<c_char>(), chroma, 4);
        }
        if !pitches.is_null() {
            for (index, pitch) in descriptor.pitches().iter().enumerate() {
                *pitches.add(index) = *pitch;
            }
        }
        if !lines.is_null() {
            for (index, count) in descriptor.line_counts().iter().enumerate() {
                *lines.add(index) = *count;
            }
        }
    }
    flags::VMEM_BRIDGE_PICTURE_BUFFERS
}

#[unsafe(no_mangle)]
/// ### English
/// Cleanup callback: releases the frame buffers and queues `FrameCleanup`.
///
/// ### 中文
/// 清理回调：释放帧缓冲并入队 `FrameCleanup`。
pub unsafe extern "C" fn vmem_bridge_video_cleanup_cb(opaque: *mut c_void) {
    if let Some(bridge) = unsafe { producer(opaque) } {
        bridge.cleanup();
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Lock callback: writes one plane pointer per plane into `planes`.
///
/// When no buffer has been negotiated every entry is set to NULL. Returns NULL as the picture
/// identifier.
///
/// ### 中文
/// lock 回调：向 `planes` 写入每个平面的指针。
///
/// 尚未协商缓冲时所有项都写为 NULL。返回 NULL 作为图像标识。
pub unsafe extern "C" fn vmem_bridge_video_lock_cb(
    opaque: *mut c_void,
    planes: *mut *mut c_void,
) -> *mut c_void {
    let Some(bridge) = (unsafe { producer(opaque) }) else {
        return ptr::null_mut();
    };
    if planes.is_null() {
        return ptr::null_mut();
    }

    match bridge.lock_for_write() {
        Ok(pointers) => unsafe {
            for (index, plane) in pointers.as_slice().iter().enumerate() {
                *planes.add(index) = plane.cast::<c_void>();
            }
        },
        Err(_) => unsafe {
            for index in 0..crate::engine::frame::MAX_PLANES {
                *planes.add(index) = ptr::null_mut();
            }
        },
    }
    ptr::null_mut()
}

#[unsafe(no_mangle)]
/// ### English
/// Unlock callback: the decoder finished writing the current picture.
///
/// ### 中文
/// unlock 回调：解码器已写完当前图像。
pub unsafe extern "C" fn vmem_bridge_video_unlock_cb(
    opaque: *mut c_void,
    _picture: *mut c_void,
    _planes: *const *mut c_void,
) {
    if let Some(bridge) = unsafe { producer(opaque) } {
        bridge.unlock_after_write();
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Display callback: queues `FrameReady` for the picture just written.
///
/// ### 中文
/// display 回调：为刚写完的图像入队 `FrameReady`。
pub unsafe extern "C" fn vmem_bridge_video_display_cb(opaque: *mut c_void, _picture: *mut c_void) {
    if let Some(bridge) = unsafe { producer(opaque) } {
        bridge.display_ready();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::flags::{VMEM_BRIDGE_PIXEL_FORMAT_I420, VMEM_BRIDGE_PIXEL_FORMAT_RV32};
    use crate::ffi::bridge::{
        vmem_bridge_create, vmem_bridge_destroy, vmem_bridge_registry_create,
        vmem_bridge_registry_destroy,
    };

    #[test]
    fn format_cb_reports_planar_layout() {
        let registry = vmem_bridge_registry_create(VMEM_BRIDGE_PIXEL_FORMAT_I420);
        let handle = unsafe { vmem_bridge_create(registry) };
        let mut opaque = handle.cast::<c_void>();
        let mut chroma = [0 as c_char; 4];
        let (mut width, mut height) = (641, 481);
        let mut pitches = [0 as c_uint; 5];
        let mut lines = [0 as c_uint; 5];

        let buffers = unsafe {
            vmem_bridge_video_format_cb(
                &mut opaque,
                chroma.as_mut_ptr(),
                &mut width,
                &mut height,
                pitches.as_mut_ptr(),
                lines.as_mut_ptr(),
            )
        };

        assert_eq!(buffers, flags::VMEM_BRIDGE_PICTURE_BUFFERS);
        assert_eq!(chroma.map(|c| c as u8), *b"I420");
        assert_eq!(pitches[..3], [644, 324, 324]);
        assert_eq!(lines[..3], [482, 241, 241]);
        unsafe {
            vmem_bridge_destroy(handle);
            vmem_bridge_registry_destroy(registry);
        }
    }

    #[test]
    fn format_cb_rejects_zero_geometry_and_lock_yields_null_planes() {
        let registry = vmem_bridge_registry_create(VMEM_BRIDGE_PIXEL_FORMAT_RV32);
        let handle = unsafe { vmem_bridge_create(registry) };
        let mut opaque = handle.cast::<c_void>();
        let mut chroma = [0 as c_char; 4];
        let (mut width, mut height) = (0, 720);
        let mut pitches = [0 as c_uint; 5];
        let mut lines = [0 as c_uint; 5];

        let buffers = unsafe {
            vmem_bridge_video_format_cb(
                &mut opaque,
                chroma.as_mut_ptr(),
                &mut width,
                &mut height,
                pitches.as_mut_ptr(),
                lines.as_mut_ptr(),
            )
        };
        assert_eq!(buffers, 0);
        assert_eq!(pitches, [0; 5]);

        let mut planes = [1usize as *mut c_void; 3];
        unsafe { vmem_bridge_video_lock_cb(opaque, planes.as_mut_ptr()) };
        assert!(planes.iter().all(|plane| plane.is_null()));
        unsafe {
            vmem_bridge_destroy(handle);
            vmem_bridge_registry_destroy(registry);
        }
    }
}
