//! ### English
//! Consumer-side handler registry. Handlers run only on the consumer thread, inside a drain.
//!
//! ### 中文
//! 消费者侧处理函数注册表。处理函数只在消费者线程的 drain 过程中运行。

use crate::engine::events::{PlayerEvent, PlayerEventKind};
use crate::engine::frame::{ConsumerBuffer, FrameBufferDescriptor, FrameRef};

type FrameSetupHandler = Box<dyn FnMut(&FrameBufferDescriptor) -> Option<ConsumerBuffer>>;
type FrameReadyHandler = Box<dyn for<'a> FnMut(Option<FrameRef<'a>>)>;
type FrameCleanupHandler = Box<dyn FnMut()>;
type PlayerEventHandler = Box<dyn FnMut(&PlayerEvent)>;

/// ### English
/// Optional handlers, one per frame notification plus one per player event kind.
/// A missing handler makes the matching work item a no-op.
///
/// ### 中文
/// 可选的处理函数：每种帧通知一个，每种播放器事件类型一个。
/// 缺失的处理函数会让对应工作条目成为空操作。
#[derive(Default)]
pub struct Handlers {
    frame_setup: Option<FrameSetupHandler>,
    frame_ready: Option<FrameReadyHandler>,
    frame_cleanup: Option<FrameCleanupHandler>,
    player_events: [Option<PlayerEventHandler>; PlayerEventKind::COUNT],
}

impl Handlers {
    /// ### English
    /// Sets the `FrameSetup` handler. Returning a buffer attaches it for subsequent frames; it must
    /// be at least `descriptor.total_size()` bytes and stay valid until `FrameCleanup` or the next
    /// `FrameSetup`.
    ///
    /// ### 中文
    /// 设置 `FrameSetup` 处理函数。返回的缓冲会被 attach 用于之后的帧；其大小至少为
    /// `descriptor.total_size()` 字节，且在 `FrameCleanup` 或下一次 `FrameSetup` 之前保持有效。
    pub fn on_frame_setup<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&FrameBufferDescriptor) -> Option<ConsumerBuffer> + 'static,
    {
        self.frame_setup = Some(Box::new(handler));
        self
    }

    /// ### English
    /// Sets the `FrameReady` handler. `None` means a frame was displayed with no buffer in place.
    ///
    /// ### 中文
    /// 设置 `FrameReady` 处理函数。`None` 表示在没有缓冲的情况下发生了 display。
    pub fn on_frame_ready<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> FnMut(Option<FrameRef<'a>>) + 'static,
    {
        self.frame_ready = Some(Box::new(handler));
        self
    }

    pub fn on_frame_cleanup<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut() + 'static,
    {
        self.frame_cleanup = Some(Box::new(handler));
        self
    }

    /// ### English
    /// Sets the handler for one player event kind, replacing any previous one.
    ///
    /// ### 中文
    /// 设置某一播放器事件类型的处理函数（替换已有的）。
    pub fn on_player_event<F>(&mut self, kind: PlayerEventKind, handler: F) -> &mut Self
    where
        F: FnMut(&PlayerEvent) + 'static,
    {
        self.player_events[kind.index()] = Some(Box::new(handler));
        self
    }

    pub fn clear_player_event(&mut self, kind: PlayerEventKind) -> &mut Self {
        self.player_events[kind.index()] = None;
        self
    }

    pub fn has_player_event(&self, kind: PlayerEventKind) -> bool {
        self.player_events[kind.index()].is_some()
    }

    pub(crate) fn frame_setup(
        &mut self,
        descriptor: &FrameBufferDescriptor,
    ) -> Option<ConsumerBuffer> {
        self.frame_setup.as_mut().and_then(|handler| handler(descriptor))
    }

    pub(crate) fn frame_ready(&mut self, frame: Option<FrameRef<'_>>) {
        if let Some(handler) = self.frame_ready.as_mut() {
            handler(frame);
        }
    }

    pub(crate) fn frame_cleanup(&mut self) {
        if let Some(handler) = self.frame_cleanup.as_mut() {
            handler();
        }
    }

    pub(crate) fn player_event(&mut self, event: &PlayerEvent) {
        if let Some(handler) = self.player_events[event.kind().index()].as_mut() {
            handler(event);
        }
    }
}
