//! ### English
//! Frame buffer negotiation, frame memory and the zero-copy handoff state machine shared between
//! the decoder's video thread (producer) and the consumer thread.
//!
//! ### 中文
//! 帧缓冲协商、帧内存，以及解码器视频线程（生产者）与消费者线程之间共享的零拷贝交接状态机。
mod buffer;
mod handoff;
mod layout;
mod negotiator;

pub use buffer::{ConsumerBuffer, FrameRef, FrameSource, PlanePointers};
pub use handoff::BufferOwnership;
pub use layout::{FrameBufferDescriptor, MAX_PLANES, PixelFormat};

pub(crate) use buffer::WriteTarget;
pub(crate) use handoff::FrameHandoff;
pub(crate) use negotiator::Negotiator;
