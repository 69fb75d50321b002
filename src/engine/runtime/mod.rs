//! ### English
//! Bridge runtime: producer-side callbacks, the coalesced work queue, and the consumer drain loop.
//!
//! ### 中文
//! bridge 运行时：生产者侧回调、合并唤醒的工作队列，以及消费者 drain 循环。

mod bridge;
mod callbacks;
mod consumer;
mod handlers;
mod queue;
mod registry;
mod wake;
mod work_item;

pub use bridge::VideoBridge;
pub use callbacks::DecoderCallbacks;
pub use consumer::BridgeConsumer;
pub use handlers::Handlers;
pub use registry::BridgeRegistry;
pub use wake::{ChannelWaker, ThreadWaker, Waker, wake_channel};
