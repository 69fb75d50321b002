//! ### English
//! Bridge factory: allocates instance IDs, applies the shared configuration, and tracks live
//! bridges.
//!
//! ### 中文
//! bridge 工厂：分配实例 ID、应用共享配置并跟踪存活的 bridge。

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use tracing::debug;

use crate::engine::config::BridgeConfig;

use super::bridge::VideoBridge;
use super::consumer::BridgeConsumer;
use super::wake::{Waker, wake_channel};

/// ### English
/// Creates player bridges. Each bridge is independent; the registry only hands out IDs and
/// counts how many are alive.
///
/// ### 中文
/// 创建播放器 bridge。每个 bridge 相互独立；注册表只负责分配 ID 与统计存活数量。
pub struct BridgeRegistry {
    config: BridgeConfig,
    /// ### English
    /// Next instance ID (starts at `1`; `0` is never handed out).
    ///
    /// ### 中文
    /// 下一个实例 ID（从 `1` 开始；永不分配 `0`）。
    next_id: AtomicU32,
    live: Arc<AtomicUsize>,
}

impl BridgeRegistry {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            next_id: AtomicU32::new(1),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn allocate_id(&self) -> u32 {
        let mut id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if id == 0 {
            id = self.next_id.fetch_add(1, Ordering::Relaxed);
        }
        id
    }

    /// ### English
    /// Creates a bridge whose wakes go to a channel the consumer waits on via
    /// [`BridgeConsumer::wait_timeout`].
    ///
    /// ### 中文
    /// 创建一个 bridge，其唤醒发送到 channel，消费者通过 [`BridgeConsumer::wait_timeout`] 等待。
    pub fn create_player(&self) -> BridgeConsumer {
        let (waker, rx) = wake_channel();
        self.create(Some(Arc::new(waker)), Some(rx))
    }

    /// ### English
    /// Creates a bridge that wakes the consumer through `waker` (an event-loop handle, a
    /// [`super::ThreadWaker`], ...). `None` leaves wakes undelivered until one is installed with
    /// [`VideoBridge::set_waker`].
    ///
    /// #### Parameters
    /// - `waker`: Wake sink for the consumer thread.
    ///
    /// ### 中文
    /// 创建一个通过 `waker`（事件循环句柄、[`super::ThreadWaker`] 等）唤醒消费者的 bridge。
    /// 传 `None` 时，唤醒在通过 [`VideoBridge::set_waker`] 安装 waker 之前不会送达。
    ///
    /// #### 参数
    /// - `waker`：消费者线程的唤醒出口。
    pub fn create_player_with_waker(&self, waker: Option<Arc<dyn Waker>>) -> BridgeConsumer {
        self.create(waker, None)
    }

    fn create(
        &self,
        waker: Option<Arc<dyn Waker>>,
        wake_rx: Option<crossbeam_channel::Receiver<()>>,
    ) -> BridgeConsumer {
        let id = self.allocate_id();
        let bridge = Arc::new(VideoBridge::new(id, &self.config, waker, self.live.clone()));
        debug!(
            target: "vmem_bridge",
            id,
            format = self.config.pixel_format.as_str(),
            "bridge created"
        );
        BridgeConsumer::new(bridge, wake_rx)
    }

    /// ### English
    /// Number of bridges not yet dropped (a bridge lives as long as any `Arc` to it).
    ///
    /// ### 中文
    /// 尚未 drop 的 bridge 数量（只要还有 `Arc` 引用，bridge 就存活）。
    pub fn live_players(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

impl Default for BridgeRegistry {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}
