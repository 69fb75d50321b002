/// ### English
/// Engine internal modules (frame negotiation and handoff, event translation, bridge runtime).
///
/// ### 中文
/// 引擎内部模块（帧协商与交接、事件翻译、bridge 运行时）。
pub mod config;
pub mod error;
pub mod events;
pub mod flags;
pub mod frame;
pub mod runtime;
