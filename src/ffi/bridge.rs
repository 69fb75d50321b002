//! ### English
//! C ABI bindings for registry and bridge lifecycle and configuration.
//!
//! ### 中文
//! 注册表与 bridge 生命周期及配置的 C ABI 绑定。

use crate::engine::config::BridgeConfig;
use crate::engine::frame::PixelFormat;
use crate::engine::runtime::BridgeRegistry;

use super::{VmemBridge, VmemBridgeRegistry};

#[unsafe(no_mangle)]
/// ### English
/// Creates a bridge registry.
///
/// Unknown `pixel_format` selectors fall back to `VMEM_BRIDGE_PIXEL_FORMAT_I420`.
///
/// #### Parameters
/// - `pixel_format`: Default `VMEM_BRIDGE_PIXEL_FORMAT_*` selector for bridges created from it.
///
/// ### 中文
/// 创建 bridge 注册表。
///
/// 未知的 `pixel_format` 选择值回退为 `VMEM_BRIDGE_PIXEL_FORMAT_I420`。
///
/// #### 参数
/// - `pixel_format`：由它创建的 bridge 的默认 `VMEM_BRIDGE_PIXEL_FORMAT_*` 选择值。
pub extern "C" fn vmem_bridge_registry_create(pixel_format: u32) -> *mut VmemBridgeRegistry {
    let config = BridgeConfig::default().with_pixel_format(PixelFormat::from_abi(pixel_format));
    Box::into_raw(Box::new(VmemBridgeRegistry {
        registry: BridgeRegistry::new(config),
    }))
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a registry created by `vmem_bridge_registry_create`.
///
/// Bridges already created from it stay valid and must still be destroyed with
/// `vmem_bridge_destroy`.
///
/// ### 中文
/// 销毁由 `vmem_bridge_registry_create` 创建的注册表。
///
/// 已由它创建的 bridge 仍然有效，仍需通过 `vmem_bridge_destroy` 销毁。
pub unsafe extern "C" fn vmem_bridge_registry_destroy(registry: *mut VmemBridgeRegistry) {
    if registry.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(registry));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Returns the registry's default `VMEM_BRIDGE_PIXEL_FORMAT_*` selector (`0` for NULL).
///
/// ### 中文
/// 返回注册表默认的 `VMEM_BRIDGE_PIXEL_FORMAT_*` 选择值（NULL 时返回 `0`）。
pub unsafe extern "C" fn vmem_bridge_registry_default_pixel_format(
    registry: *const VmemBridgeRegistry,
) -> u32 {
    if registry.is_null() {
        return 0;
    }
    unsafe { (*registry).registry.config().pixel_format.as_abi() }
}

#[unsafe(no_mangle)]
/// ### English
/// Number of bridges created from this registry and not yet destroyed.
///
/// ### 中文
/// 由该注册表创建且尚未销毁的 bridge 数量。
pub unsafe extern "C" fn vmem_bridge_registry_live_count(
    registry: *const VmemBridgeRegistry,
) -> usize {
    if registry.is_null() {
        return 0;
    }
    unsafe { (*registry).registry.live_players() }
}

#[unsafe(no_mangle)]
/// ### English
/// Creates one bridge from `registry`, using the registry's pixel format.
///
/// Must be called on the consumer thread. Returns NULL if `registry` is NULL.
///
/// ### 中文
/// 由 `registry` 创建一个 bridge，使用注册表的像素格式。
///
/// 必须在消费者线程调用。`registry` 为 NULL 时返回 NULL。
pub unsafe extern "C" fn vmem_bridge_create(registry: *const VmemBridgeRegistry) -> *mut VmemBridge {
    if registry.is_null() {
        return std::ptr::null_mut();
    }
    let consumer = unsafe { (*registry).registry.create_player() };
    let bridge = consumer.bridge().clone();
    Box::into_raw(Box::new(VmemBridge { bridge, consumer }))
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a bridge created by `vmem_bridge_create`.
///
/// Runs a final drain on the calling (consumer) thread, then discards anything queued later. The
/// decoder must already be stopped: no decoder callback may use this handle during or after the
/// call.
///
/// ### 中文
/// 销毁由 `vmem_bridge_create` 创建的 bridge。
///
/// 会在调用线程（消费者线程）上做最后一次 drain，之后入队的内容全部丢弃。解码器必须已经停止：
/// 调用期间及之后不得再有解码器回调使用该句柄。
pub unsafe extern "C" fn vmem_bridge_destroy(bridge: *mut VmemBridge) {
    if bridge.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(bridge));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Sets the pixel format used by subsequent negotiations of one bridge.
///
/// ### 中文
/// 设置单个 bridge 之后协商所用的像素格式。
pub unsafe extern "C" fn vmem_bridge_set_pixel_format(bridge: *mut VmemBridge, pixel_format: u32) {
    if bridge.is_null() {
        return;
    }
    let bridge = unsafe { &(*bridge).bridge };
    bridge.set_pixel_format(PixelFormat::from_abi(pixel_format));
}
