use async_trait::async_trait;

use crate::error::ApplicationError;
use domain::{RoomId, UserSnapshot};

/// 房间在线集合存储trait
///
/// 每个房间至多保存一个同 ID 用户的快照。集合在首次进入时隐式创建，
/// 最后一个成员离开后可以为空，但不会被显式销毁。
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// 用户进入房间；已在线时为空操作
    async fn enter(&self, room_id: RoomId, user: &UserSnapshot) -> Result<(), ApplicationError>;

    /// 用户离开房间；按用户 ID 匹配，不在线时为空操作
    async fn leave(&self, room_id: RoomId, user: &UserSnapshot) -> Result<(), ApplicationError>;

    /// 当前在线成员的快照，调用方需要重新查询才能看到后续变化
    async fn list(&self, room_id: RoomId) -> Result<Vec<UserSnapshot>, ApplicationError>;
}

/// 内存实现的在线状态存储（用于测试和单实例部署）
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct MemoryPresenceStore {
        rooms: RwLock<HashMap<RoomId, Vec<UserSnapshot>>>,
    }

    impl MemoryPresenceStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PresenceStore for MemoryPresenceStore {
        async fn enter(
            &self,
            room_id: RoomId,
            user: &UserSnapshot,
        ) -> Result<(), ApplicationError> {
            // 检查与插入在同一把写锁内完成
            let mut rooms = self.rooms.write().await;
            let members = rooms.entry(room_id).or_default();
            if !members.iter().any(|member| member.id == user.id) {
                members.push(user.clone());
            }
            Ok(())
        }

        async fn leave(
            &self,
            room_id: RoomId,
            user: &UserSnapshot,
        ) -> Result<(), ApplicationError> {
            let mut rooms = self.rooms.write().await;
            if let Some(members) = rooms.get_mut(&room_id) {
                members.retain(|member| member.id != user.id);
            }
            Ok(())
        }

        async fn list(&self, room_id: RoomId) -> Result<Vec<UserSnapshot>, ApplicationError> {
            let rooms = self.rooms.read().await;
            Ok(rooms.get(&room_id).cloned().unwrap_or_default())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use domain::UserId;
        use time::OffsetDateTime;

        fn snapshot(name: &str) -> UserSnapshot {
            UserSnapshot {
                id: UserId::generate(),
                fullname: name.to_owned(),
                email: format!("{}@x.com", name.to_lowercase()),
                avatar_url: None,
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
            }
        }

        #[tokio::test]
        async fn repeated_enter_keeps_one_entry() {
            let store = MemoryPresenceStore::new();
            let room = RoomId::new(1);
            let alice = snapshot("Alice");

            for _ in 0..5 {
                store.enter(room, &alice).await.unwrap();
            }

            let members = store.list(room).await.unwrap();
            assert_eq!(members, vec![alice]);
        }

        #[tokio::test]
        async fn same_user_with_stale_fields_is_still_deduplicated() {
            let store = MemoryPresenceStore::new();
            let room = RoomId::new(1);
            let alice = snapshot("Alice");
            let mut renamed = alice.clone();
            renamed.fullname = "Alice Renamed".into();

            store.enter(room, &alice).await.unwrap();
            store.enter(room, &renamed).await.unwrap();
            assert_eq!(store.list(room).await.unwrap().len(), 1);

            // 按 ID 删除，不要求快照完全一致
            store.leave(room, &renamed).await.unwrap();
            assert!(store.list(room).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn enter_then_leave_restores_previous_list() {
            let store = MemoryPresenceStore::new();
            let room = RoomId::new(9);
            let bob = snapshot("Bob");
            let carol = snapshot("Carol");

            store.enter(room, &bob).await.unwrap();
            let before = store.list(room).await.unwrap();

            store.enter(room, &carol).await.unwrap();
            store.leave(room, &carol).await.unwrap();

            assert_eq!(store.list(room).await.unwrap(), before);
        }

        #[tokio::test]
        async fn leaving_unknown_room_or_member_is_noop() {
            let store = MemoryPresenceStore::new();
            let bob = snapshot("Bob");

            store.leave(RoomId::new(3), &bob).await.unwrap();
            assert!(store.list(RoomId::new(3)).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn rooms_are_independent() {
            let store = MemoryPresenceStore::new();
            let bob = snapshot("Bob");

            store.enter(RoomId::new(1), &bob).await.unwrap();
            assert!(store.list(RoomId::new(2)).await.unwrap().is_empty());
            assert_eq!(store.list(RoomId::new(1)).await.unwrap().len(), 1);
        }
    }
}
