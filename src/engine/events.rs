//! ### English
//! Player event translation: the decoder's native tagged events become generic events with an
//! ordered scalar argument list.
//!
//! The mapping is a fixed table; native kinds without an entry are dropped at the boundary.
//!
//! ### 中文
//! 播放器事件翻译：把解码器原生的带标签事件转换为带有序标量参数列表的通用事件。
//!
//! 映射是固定表；没有表项的原生类型在边界处直接丢弃。

/// ### English
/// Native player event as decoded from the engine's tagged union (one variant per event code).
///
/// ### 中文
/// 从引擎带标签联合体解码得到的原生播放器事件（每个事件码一个变体）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeEvent {
    MediaChanged,
    NothingSpecial,
    Opening,
    Buffering { new_cache: f32 },
    Playing,
    Paused,
    Stopped,
    Forward,
    Backward,
    EndReached,
    EncounteredError,
    TimeChanged { new_time: i64 },
    PositionChanged { new_position: f32 },
    SeekableChanged { new_seekable: i32 },
    PausableChanged { new_pausable: i32 },
    TitleChanged { new_title: i32 },
    SnapshotTaken,
    LengthChanged { new_length: i64 },
    Vout { new_count: i32 },
    ScrambledChanged { new_scrambled: i32 },
    /// ### English
    /// Any code outside the known player range.
    ///
    /// ### 中文
    /// 已知播放器范围之外的任意事件码。
    Unknown(i32),
}

/// ### English
/// Generic event kinds surfaced to the consumer.
///
/// ### 中文
/// 交给消费者的通用事件类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlayerEventKind {
    MediaChanged = 0,
    NothingSpecial,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    Forward,
    Backward,
    EndReached,
    EncounteredError,
    TimeChanged,
    PositionChanged,
    SeekableChanged,
    PausableChanged,
    LengthChanged,
}

impl PlayerEventKind {
    /// ### English
    /// Number of kinds (size of the per-kind handler table).
    ///
    /// ### 中文
    /// 类型数量（按类型分派的处理函数表大小）。
    pub const COUNT: usize = 16;

    pub const ALL: [PlayerEventKind; Self::COUNT] = [
        Self::MediaChanged,
        Self::NothingSpecial,
        Self::Opening,
        Self::Buffering,
        Self::Playing,
        Self::Paused,
        Self::Stopped,
        Self::Forward,
        Self::Backward,
        Self::EndReached,
        Self::EncounteredError,
        Self::TimeChanged,
        Self::PositionChanged,
        Self::SeekableChanged,
        Self::PausableChanged,
        Self::LengthChanged,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MediaChanged => "media_changed",
            Self::NothingSpecial => "nothing_special",
            Self::Opening => "opening",
            Self::Buffering => "buffering",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::EndReached => "end_reached",
            Self::EncounteredError => "encountered_error",
            Self::TimeChanged => "time_changed",
            Self::PositionChanged => "position_changed",
            Self::SeekableChanged => "seekable_changed",
            Self::PausableChanged => "pausable_changed",
            Self::LengthChanged => "length_changed",
        }
    }
}

/// ### English
/// Scalar event argument.
///
/// ### 中文
/// 标量事件参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventArg {
    Number(f64),
    Bool(bool),
}

impl EventArg {
    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(value),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(value),
            Self::Number(_) => None,
        }
    }
}

/// ### English
/// Generic player event: a kind plus zero or one scalar argument.
///
/// ### 中文
/// 通用播放器事件：一个类型加零个或一个标量参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerEvent {
    kind: PlayerEventKind,
    arg: Option<EventArg>,
}

impl PlayerEvent {
    pub fn new(kind: PlayerEventKind, arg: Option<EventArg>) -> Self {
        Self { kind, arg }
    }

    #[inline]
    pub fn kind(&self) -> PlayerEventKind {
        self.kind
    }

    /// ### English
    /// Ordered argument list (empty or one element).
    ///
    /// ### 中文
    /// 有序参数列表（为空或只有一个元素）。
    #[inline]
    pub fn args(&self) -> &[EventArg] {
        self.arg.as_slice()
    }
}

/// ### English
/// Translates one native event. Returns `None` for kinds without a mapping.
///
/// ### 中文
/// 翻译一个原生事件；没有映射的类型返回 `None`。
pub fn translate(event: &NativeEvent) -> Option<PlayerEvent> {
    use PlayerEventKind as Kind;

    let (kind, arg) = match *event {
        NativeEvent::MediaChanged => (Kind::MediaChanged, None),
        NativeEvent::NothingSpecial => (Kind::NothingSpecial, None),
        NativeEvent::Opening => (Kind::Opening, None),
        NativeEvent::Buffering { new_cache } => {
            (Kind::Buffering, Some(EventArg::Number(f64::from(new_cache))))
        }
        NativeEvent::Playing => (Kind::Playing, None),
        NativeEvent::Paused => (Kind::Paused, None),
        NativeEvent::Stopped => (Kind::Stopped, None),
        NativeEvent::Forward => (Kind::Forward, None),
        NativeEvent::Backward => (Kind::Backward, None),
        NativeEvent::EndReached => (Kind::EndReached, None),
        NativeEvent::EncounteredError => (Kind::EncounteredError, None),
        NativeEvent::TimeChanged { new_time } => {
            (Kind::TimeChanged, Some(EventArg::Number(new_time as f64)))
        }
        NativeEvent::PositionChanged { new_position } => (
            Kind::PositionChanged,
            Some(EventArg::Number(f64::from(new_position))),
        ),
        NativeEvent::SeekableChanged { new_seekable } => {
            (Kind::SeekableChanged, Some(EventArg::Bool(new_seekable != 0)))
        }
        NativeEvent::PausableChanged { new_pausable } => {
            (Kind::PausableChanged, Some(EventArg::Bool(new_pausable != 0)))
        }
        NativeEvent::LengthChanged { new_length } => {
            (Kind::LengthChanged, Some(EventArg::Number(new_length as f64)))
        }
        NativeEvent::TitleChanged { .. }
        | NativeEvent::SnapshotTaken
        | NativeEvent::Vout { .. }
        | NativeEvent::ScrambledChanged { .. }
        | NativeEvent::Unknown(_) => return None,
    };

    Some(PlayerEvent::new(kind, arg))
}
