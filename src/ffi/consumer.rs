//! ### English
//! C ABI bindings for the consumer thread: handler registration, wake sink, drain and wait.
//!
//! ### 中文
//! 消费者线程的 C ABI 绑定：处理函数注册、唤醒出口、drain 与等待。

use std::ffi::c_void;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::events::PlayerEventKind;
use crate::engine::frame::ConsumerBuffer;
use crate::engine::runtime::Waker;

use super::{VmemBridge, VmemBridgeCallbacks, VmemBridgeEvent, VmemBridgeFrame, VmemBridgeFrameSetup};

/// ### English
/// Wake sink backed by a C function pointer (for example a function that signals an event-loop
/// async handle).
///
/// ### 中文
/// 以 C 函数指针实现的唤醒出口（例如通知事件循环 async 句柄的函数）。
struct CallbackWaker {
    wake: unsafe extern "C" fn(user_data: *mut c_void),
    user_data: *mut c_void,
}

/* ### English
   The embedder guarantees `wake` is callable from any thread with this `user_data`.

   ### 中文
   宿主保证 `wake` 可在任意线程以该 `user_data` 调用。
*/
unsafe impl Send for CallbackWaker {}
unsafe impl Sync for CallbackWaker {}

impl Waker for CallbackWaker {
    fn wake(&self) {
        unsafe { (self.wake)(self.user_data) }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Installs the consumer callback table, replacing every previously registered handler.
///
/// `callbacks` is copied; NULL entries leave the matching work items as no-ops. A NULL table
/// clears all handlers.
///
/// ### 中文
/// 安装消费者回调表，替换之前注册的全部处理函数。
///
/// `callbacks` 会被拷贝；NULL 项使对应工作条目成为空操作。传入 NULL 表会清空全部处理函数。
pub unsafe extern "C" fn vmem_bridge_set_callbacks(
    bridge: *mut VmemBridge,
    callbacks: *const VmemBridgeCallbacks,
) {
    if bridge.is_null() {
        return;
    }
    let consumer = unsafe { &mut (*bridge).consumer };
    let handlers = consumer.handlers_mut();
    *handlers = Default::default();
    if callbacks.is_null() {
        return;
    }
    let table = unsafe { *callbacks };
    let user_data = table.user_data;

    if let Some(frame_setup) = table.frame_setup {
        handlers.on_frame_setup(move |descriptor| {
            let setup = VmemBridgeFrameSetup::from(descriptor);
            let buffer = unsafe { frame_setup(user_data, &setup) };
            unsafe { ConsumerBuffer::from_raw_parts(buffer.data, buffer.len) }
        });
    }
    if let Some(frame_ready) = table.frame_ready {
        handlers.on_frame_ready(move |frame| match frame {
            Some(frame) => {
                let frame = VmemBridgeFrame::from(frame);
                unsafe { frame_ready(user_data, &frame) }
            }
            None => unsafe { frame_ready(user_data, std::ptr::null()) },
        });
    }
    if let Some(frame_cleanup) = table.frame_cleanup {
        handlers.on_frame_cleanup(move || unsafe { frame_cleanup(user_data) });
    }
    if let Some(player_event) = table.player_event {
        for kind in PlayerEventKind::ALL {
            handlers.on_player_event(kind, move |event| {
                let event = VmemBridgeEvent::from(event);
                unsafe { player_event(user_data, &event) }
            });
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Installs the wake sink invoked (at most once per drain) when work becomes pending. A NULL
/// `wake` removes it; `vmem_bridge_wait` then falls back to its timeout.
///
/// `wake` may be called from any decoder thread and must not block or call back into the bridge.
///
/// ### 中文
/// 安装有待处理工作时调用的唤醒出口（每次 drain 之间最多调用一次）。`wake` 为 NULL 时移除它，
/// 此后 `vmem_bridge_wait` 只能依靠超时返回。
///
/// `wake` 可能在任意解码器线程调用，不得阻塞，也不得回调 bridge。
pub unsafe extern "C" fn vmem_bridge_set_waker(
    bridge: *mut VmemBridge,
    wake: Option<unsafe extern "C" fn(user_data: *mut c_void)>,
    user_data: *mut c_void,
) {
    if bridge.is_null() {
        return;
    }
    let bridge = unsafe { &(*bridge).bridge };
    let waker = wake.map(|wake| Arc::new(CallbackWaker { wake, user_data }) as Arc<dyn Waker>);
    bridge.set_waker(waker);
}

#[unsafe(no_mangle)]
/// ### English
/// Processes all pending work on the calling (consumer) thread. Returns the number of items
/// processed.
///
/// ### 中文
/// 在调用线程（消费者线程）上处理全部待处理工作，返回处理的条目数量。
pub unsafe extern "C" fn vmem_bridge_drain(bridge: *mut VmemBridge) -> usize {
    if bridge.is_null() {
        return 0;
    }
    let consumer = unsafe { &mut (*bridge).consumer };
    consumer.drain()
}

#[unsafe(no_mangle)]
/// ### English
/// Blocks up to `timeout_ms` for a wake, then drains. Returns the number of items processed.
///
/// Intended for hosts without an event loop; only wakes from the built-in channel sink are seen
/// (not after `vmem_bridge_set_waker` replaced it).
///
/// ### 中文
/// 最多阻塞 `timeout_ms` 毫秒等待唤醒，然后 drain。返回处理的条目数量。
///
/// 供没有事件循环的宿主使用；只能感知内置 channel 出口的唤醒（`vmem_bridge_set_waker` 替换后不再生效）。
pub unsafe extern "C" fn vmem_bridge_wait(bridge: *mut VmemBridge, timeout_ms: u32) -> usize {
    if bridge.is_null() {
        return 0;
    }
    let consumer = unsafe { &mut (*bridge).consumer };
    consumer.wait_and_drain(Duration::from_millis(u64::from(timeout_ms)))
}

#[unsafe(no_mangle)]
/// ### English
/// Number of work items queued and not yet drained.
///
/// ### 中文
/// 已入队但尚未 drain 的工作条目数量。
pub unsafe extern "C" fn vmem_bridge_pending_len(bridge: *const VmemBridge) -> usize {
    if bridge.is_null() {
        return 0;
    }
    unsafe { (*bridge).bridge.pending_len() }
}
