//! 在线成员变化的发布/订阅
//!
//! 广播是尽力而为的：`publish` 不向调用方返回错误，失败只记日志。

use std::pin::Pin;

use async_trait::async_trait;
use domain::{presence_topic, PresenceEvent, RoomId};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

/// 某个房间的在线事件流。不会自行结束，订阅方丢弃即取消。
pub type PresenceStream = Pin<Box<dyn Stream<Item = PresenceEvent> + Send>>;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[async_trait]
pub trait PresenceNotifier: Send + Sync {
    /// 发布事件。投递失败在内部记录后吞掉。
    async fn publish(&self, event: PresenceEvent);

    /// 订阅指定房间，只会收到 `chatroom_id` 匹配的事件
    fn subscribe(&self, room_id: RoomId) -> PresenceStream;
}

/// 进程内广播器，启动时创建一次并注入到需要的组件
#[derive(Clone)]
pub struct LocalPresenceBroker {
    sender: broadcast::Sender<PresenceEvent>,
}

impl LocalPresenceBroker {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn send(&self, event: PresenceEvent) -> Result<usize, BroadcastError> {
        self.sender
            .send(event)
            .map_err(|err| BroadcastError::failed(err.to_string()))
    }
}

impl Default for LocalPresenceBroker {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl PresenceNotifier for LocalPresenceBroker {
    async fn publish(&self, event: PresenceEvent) {
        let topic = event.topic();
        if self.sender.receiver_count() == 0 {
            tracing::debug!(topic = %topic, "no presence subscribers");
            return;
        }
        match self.send(event) {
            Ok(receivers) => tracing::debug!(topic = %topic, receivers, "presence event published"),
            Err(err) => tracing::warn!(topic = %topic, error = %err, "pubSub error"),
        }
    }

    fn subscribe(&self, room_id: RoomId) -> PresenceStream {
        let topic = presence_topic(room_id);
        let stream = BroadcastStream::new(self.sender.subscribe()).filter_map(move |item| {
            match item {
                Ok(event) if event.chatroom_id == room_id => Some(event),
                Ok(_) => None,
                // 落后的订阅者跳过丢失的事件继续接收
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %topic, skipped, "presence subscriber lagged");
                    None
                }
            }
        });
        Box::pin(stream)
    }
}
