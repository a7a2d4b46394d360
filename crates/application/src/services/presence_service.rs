//! 房间在线状态用例
//!
//! 进入/离开房间后重新读取在线集合并广播。存储变更成功即返回 `true`，
//! 重新读取失败和广播失败都只记日志，不影响返回值。

use std::sync::Arc;

use domain::{PresenceEvent, RoomId, SessionClaim, UserSnapshot};

use crate::{
    error::ApplicationError,
    notifier::{PresenceNotifier, PresenceStream},
    presence::PresenceStore,
    repository::UserRepository,
};

pub struct PresenceServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub presence_store: Arc<dyn PresenceStore>,
    pub notifier: Arc<dyn PresenceNotifier>,
}

pub struct PresenceService {
    deps: PresenceServiceDependencies,
}

impl PresenceService {
    pub fn new(deps: PresenceServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn enter_room(
        &self,
        room_id: RoomId,
        claim: &SessionClaim,
    ) -> Result<bool, ApplicationError> {
        let snapshot = self.resolve_caller(claim).await?;
        self.deps.presence_store.enter(room_id, &snapshot).await?;

        tracing::info!(room_id = %room_id, user_id = %snapshot.id, "用户进入房间");
        self.broadcast(room_id).await;
        Ok(true)
    }

    pub async fn leave_room(
        &self,
        room_id: RoomId,
        claim: &SessionClaim,
    ) -> Result<bool, ApplicationError> {
        let snapshot = self.resolve_caller(claim).await?;
        self.deps.presence_store.leave(room_id, &snapshot).await?;

        tracing::info!(room_id = %room_id, user_id = %snapshot.id, "用户离开房间");
        self.broadcast(room_id).await;
        Ok(true)
    }

    pub async fn live_users(&self, room_id: RoomId) -> Result<Vec<UserSnapshot>, ApplicationError> {
        self.deps.presence_store.list(room_id).await
    }

    pub fn subscribe(&self, room_id: RoomId) -> PresenceStream {
        self.deps.notifier.subscribe(room_id)
    }

    async fn resolve_caller(&self, claim: &SessionClaim) -> Result<UserSnapshot, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_id(claim.sub)
            .await?
            .ok_or_else(|| ApplicationError::NotFound("User not found".into()))?;
        Ok(user.snapshot())
    }

    async fn broadcast(&self, room_id: RoomId) {
        let live_users = match self.deps.presence_store.list(room_id).await {
            Ok(users) => users,
            Err(err) => {
                tracing::warn!(room_id = %room_id, error = %err, "getLiveUsersForChatroom error");
                Vec::new()
            }
        };
        self.deps
            .notifier
            .publish(PresenceEvent::new(room_id, live_users))
            .await;
    }
}
