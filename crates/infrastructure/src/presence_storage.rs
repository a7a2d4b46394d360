//! Redis 在线集合存储
//!
//! 每个房间一个 hash：键为 `liveUsers:room:{id}`，字段为用户 ID，值为 JSON 快照。
//! 去重依赖 HSETNX 的原子性，多实例共享同一份集合。

use application::{ApplicationError, PresenceStore};
use async_trait::async_trait;
use domain::{presence_key, RoomId, UserSnapshot};
use redis::aio::ConnectionManager;

#[derive(Clone)]
pub struct RedisPresenceStore {
    connection: ConnectionManager,
    /// 集合的空闲过期时间，每次进入时续期；0 表示不过期
    ttl_seconds: u64,
}

impl RedisPresenceStore {
    pub fn new(connection: ConnectionManager, ttl_seconds: u64) -> Self {
        Self {
            connection,
            ttl_seconds,
        }
    }

    fn cache_error(action: &str, err: redis::RedisError) -> ApplicationError {
        ApplicationError::infrastructure_with_source(format!("presence cache {action} failed"), err)
    }
}

#[async_trait]
impl PresenceStore for RedisPresenceStore {
    async fn enter(&self, room_id: RoomId, user: &UserSnapshot) -> Result<(), ApplicationError> {
        let key = presence_key(room_id);
        let payload = serde_json::to_string(user).map_err(|err| {
            ApplicationError::infrastructure_with_source("failed to encode presence snapshot", err)
        })?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("HSETNX")
            .arg(&key)
            .arg(user.id.to_string())
            .arg(payload)
            .ignore();
        if self.ttl_seconds > 0 {
            pipe.cmd("EXPIRE").arg(&key).arg(self.ttl_seconds).ignore();
        }

        let mut conn = self.connection.clone();
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|err| Self::cache_error("enter", err))?;

        tracing::debug!(key = %key, user_id = %user.id, "presence entry written");
        Ok(())
    }

    async fn leave(&self, room_id: RoomId, user: &UserSnapshot) -> Result<(), ApplicationError> {
        let key = presence_key(room_id);
        let mut conn = self.connection.clone();
        let removed: i64 = redis::cmd("HDEL")
            .arg(&key)
            .arg(user.id.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|err| Self::cache_error("leave", err))?;

        tracing::debug!(key = %key, user_id = %user.id, removed, "presence entry removed");
        Ok(())
    }

    async fn list(&self, room_id: RoomId) -> Result<Vec<UserSnapshot>, ApplicationError> {
        let key = presence_key(room_id);
        let mut conn = self.connection.clone();
        let values: Vec<String> = redis::cmd("HVALS")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|err| Self::cache_error("list", err))?;

        // 无法解析的条目跳过，不影响其余成员
        let members = values
            .into_iter()
            .filter_map(|raw| match serde_json::from_str::<UserSnapshot>(&raw) {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "corrupt presence entry skipped");
                    None
                }
            })
            .collect();
        Ok(members)
    }
}
