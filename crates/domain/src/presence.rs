use serde::{Deserialize, Serialize};

use crate::user::UserSnapshot;
use crate::value_objects::RoomId;

/// 房间在线成员变化后的广播消息，不持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub chatroom_id: RoomId,
    pub live_users: Vec<UserSnapshot>,
}

impl PresenceEvent {
    pub fn new(chatroom_id: RoomId, live_users: Vec<UserSnapshot>) -> Self {
        Self {
            chatroom_id,
            live_users,
        }
    }

    /// 订阅主题
    pub fn topic(&self) -> String {
        presence_topic(self.chatroom_id)
    }
}

pub fn presence_topic(room_id: RoomId) -> String {
    format!("liveUsersInChatroom.{room_id}")
}

/// 房间在线集合在缓存中的键
pub fn presence_key(room_id: RoomId) -> String {
    format!("liveUsers:room:{room_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_by_room() {
        assert_eq!(presence_key(RoomId::new(42)), "liveUsers:room:42");
        assert_eq!(presence_topic(RoomId::new(42)), "liveUsersInChatroom.42");

        let event = PresenceEvent::new(RoomId::new(7), Vec::new());
        assert_eq!(event.topic(), "liveUsersInChatroom.7");
    }
}
