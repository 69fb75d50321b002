//! ### English
//! Player event callback: decodes the decoder's tagged event struct into a `NativeEvent`.
//!
//! ### 中文
//! 播放器事件回调：把解码器的带标签事件结构体解码为 `NativeEvent`。

use std::ffi::{c_float, c_int, c_void};

use crate::engine::events::NativeEvent;
use crate::engine::runtime::DecoderCallbacks;

use super::VmemBridge;

/* ### English
   Native event codes (media player range).

   ### 中文
   原生事件码（媒体播放器范围）。
*/
const MEDIA_CHANGED: c_int = 0x100;
const NOTHING_SPECIAL: c_int = 0x101;
const OPENING: c_int = 0x102;
const BUFFERING: c_int = 0x103;
const PLAYING: c_int = 0x104;
const PAUSED: c_int = 0x105;
const STOPPED: c_int = 0x106;
const FORWARD: c_int = 0x107;
const BACKWARD: c_int = 0x108;
const END_REACHED: c_int = 0x109;
const ENCOUNTERED_ERROR: c_int = 0x10a;
const TIME_CHANGED: c_int = 0x10b;
const POSITION_CHANGED: c_int = 0x10c;
const SEEKABLE_CHANGED: c_int = 0x10d;
const PAUSABLE_CHANGED: c_int = 0x10e;
const TITLE_CHANGED: c_int = 0x10f;
const SNAPSHOT_TAKEN: c_int = 0x110;
const LENGTH_CHANGED: c_int = 0x111;
const VOUT: c_int = 0x112;
const SCRAMBLED_CHANGED: c_int = 0x113;

/// ### English
/// Leading scalar of the event payload union. Only the first member of each payload is read.
///
/// ### 中文
/// 事件负载联合体的首个标量成员；每种负载只读取其第一个成员。
#[repr(C)]
#[derive(Clone, Copy)]
pub union NativeEventPayload {
    pub float: c_float,
    pub time: i64,
    pub int: c_int,
    pub ptr: *mut c_void,
}

/// ### English
/// Layout-compatible view of the decoder's event struct: type code, sender, payload.
///
/// ### 中文
/// 与解码器事件结构体布局兼容的视图：类型码、发送者、负载。
#[repr(C)]
#[derive(Clone, Copy)]
pub struct NativeEventRaw {
    pub kind: c_int,
    pub sender: *mut c_void,
    pub payload: NativeEventPayload,
}

impl NativeEventRaw {
    /// ### English
    /// Decodes the payload selected by `kind`.
    ///
    /// # Safety
    /// `payload` must hold the member that matches `kind`.
    ///
    /// ### 中文
    /// 按 `kind` 解码对应负载。
    ///
    /// # Safety
    /// `payload` 必须包含与 `kind` 对应的成员。
    pub unsafe fn decode(&self) -> NativeEvent {
        let payload = &self.payload;
        unsafe {
            match self.kind {
                MEDIA_CHANGED => NativeEvent::MediaChanged,
                NOTHING_SPECIAL => NativeEvent::NothingSpecial,
                OPENING => NativeEvent::Opening,
                BUFFERING => NativeEvent::Buffering {
                    new_cache: payload.float,
                },
                PLAYING => NativeEvent::Playing,
                PAUSED => NativeEvent::Paused,
                STOPPED => NativeEvent::Stopped,
                FORWARD => NativeEvent::Forward,
                BACKWARD => NativeEvent::Backward,
                END_REACHED => NativeEvent::EndReached,
                ENCOUNTERED_ERROR => NativeEvent::EncounteredError,
                TIME_CHANGED => NativeEvent::TimeChanged {
                    new_time: payload.time,
                },
                POSITION_CHANGED => NativeEvent::PositionChanged {
                    new_position: payload.float,
                },
                SEEKABLE_CHANGED => NativeEvent::SeekableChanged {
                    new_seekable: payload.int,
                },
                PAUSABLE_CHANGED => NativeEvent::PausableChanged {
                    new_pausable: payload.int,
                },
                TITLE_CHANGED => NativeEvent::TitleChanged {
                    new_title: payload.int,
                },
                SNAPSHOT_TAKEN => NativeEvent::SnapshotTaken,
                LENGTH_CHANGED => NativeEvent::LengthChanged {
                    new_length: payload.time,
                },
                VOUT => NativeEvent::Vout {
                    new_count: payload.int,
                },
                SCRAMBLED_CHANGED => NativeEvent::ScrambledChanged {
                    new_scrambled: payload.int,
                },
                other => NativeEvent::Unknown(other),
            }
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Event callback: translates one native event and queues it. Register it for each media-player
/// event type with the bridge handle as `user_data`.
///
/// ### 中文
/// 事件回调：翻译并入队一个原生事件。为每种媒体播放器事件类型注册，并以 bridge 句柄作为 `user_data`。
pub unsafe extern "C" fn vmem_bridge_event_cb(event: *const NativeEventRaw, user_data: *mut c_void) {
    let handle = user_data.cast::<VmemBridge>();
    if event.is_null() || handle.is_null() {
        return;
    }
    let bridge = unsafe { &(*handle).bridge };
    let native = unsafe { (*event).decode() };
    bridge.on_event(&native);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::PlayerEventKind;
    use crate::engine::flags::VMEM_BRIDGE_PIXEL_FORMAT_I420;
    use crate::ffi::bridge::{
        vmem_bridge_create, vmem_bridge_destroy, vmem_bridge_registry_create,
        vmem_bridge_registry_destroy,
    };
    use crate::ffi::consumer::{vmem_bridge_drain, vmem_bridge_set_callbacks};
    use crate::ffi::{
        VMEM_BRIDGE_EVENT_ARG_BOOL, VMEM_BRIDGE_EVENT_ARG_NUMBER, VmemBridgeCallbacks,
        VmemBridgeEvent,
    };

    fn raw(kind: c_int, payload: NativeEventPayload) -> NativeEventRaw {
        NativeEventRaw {
            kind,
            sender: std::ptr::null_mut(),
            payload,
        }
    }

    #[test]
    fn decodes_payloads_by_kind() {
        let time = raw(TIME_CHANGED, NativeEventPayload { time: 1_500 });
        assert_eq!(
            unsafe { time.decode() },
            NativeEvent::TimeChanged { new_time: 1_500 }
        );

        let buffering = raw(BUFFERING, NativeEventPayload { float: 12.5 });
        assert_eq!(
            unsafe { buffering.decode() },
            NativeEvent::Buffering { new_cache: 12.5 }
        );

        let seekable = raw(SEEKABLE_CHANGED, NativeEventPayload { int: 1 });
        assert_eq!(
            unsafe { seekable.decode() },
            NativeEvent::SeekableChanged { new_seekable: 1 }
        );

        let unknown = raw(0x200, NativeEventPayload { int: 0 });
        assert_eq!(unsafe { unknown.decode() }, NativeEvent::Unknown(0x200));
    }

    unsafe extern "C" fn record(user_data: *mut c_void, event: *const VmemBridgeEvent) {
        let events = unsafe { &mut *user_data.cast::<Vec<VmemBridgeEvent>>() };
        events.push(unsafe { *event });
    }

    #[test]
    fn event_cb_reaches_player_event_callback_after_drain() {
        let mut events: Vec<VmemBridgeEvent> = Vec::new();
        let registry = vmem_bridge_registry_create(VMEM_BRIDGE_PIXEL_FORMAT_I420);
        let table = VmemBridgeCallbacks {
            user_data: (&mut events as *mut Vec<VmemBridgeEvent>).cast(),
            frame_setup: None,
            frame_ready: None,
            frame_cleanup: None,
            player_event: Some(record),
        };

        unsafe {
            let handle = vmem_bridge_create(registry);
            vmem_bridge_set_callbacks(handle, &table);
            let opaque = handle.cast::<c_void>();

            let time = raw(TIME_CHANGED, NativeEventPayload { time: 42_000 });
            let snapshot = raw(SNAPSHOT_TAKEN, NativeEventPayload { int: 0 });
            let pausable = raw(PAUSABLE_CHANGED, NativeEventPayload { int: 1 });
            vmem_bridge_event_cb(&time, opaque);
            vmem_bridge_event_cb(&snapshot, opaque);
            vmem_bridge_event_cb(&pausable, opaque);
            vmem_bridge_event_cb(std::ptr::null(), opaque);
            assert!(events.is_empty());

            assert_eq!(vmem_bridge_drain(handle), 2);
            vmem_bridge_destroy(handle);
            vmem_bridge_registry_destroy(registry);
        }

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, PlayerEventKind::TimeChanged.index() as u32);
        assert_eq!(events[0].arg_kind, VMEM_BRIDGE_EVENT_ARG_NUMBER);
        assert_eq!(events[0].number, 42_000.0);
        assert_eq!(events[1].kind, PlayerEventKind::PausableChanged.index() as u32);
        assert_eq!(events[1].arg_kind, VMEM_BRIDGE_EVENT_ARG_BOOL);
        assert_eq!(events[1].boolean, 1);
    }
}
