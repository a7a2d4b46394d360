use async_trait::async_trait;
use domain::{FullName, RepositoryError, Timestamp, User, UserEmail, UserId};

/// 资料更新字段。头像为 `None` 表示保持原值。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub fullname: FullName,
    pub avatar_url: Option<String>,
    pub updated_at: Timestamp,
}

/// 身份存储契约
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 邮箱已存在时返回 `RepositoryError::Conflict`
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError>;
    /// 用户不存在时返回 `RepositoryError::NotFound`
    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, RepositoryError>;
    /// 按显示名称片段（不区分大小写）搜索，结果排除 `exclude`
    async fn search_by_fullname(
        &self,
        fragment: String,
        exclude: UserId,
    ) -> Result<Vec<User>, RepositoryError>;
}

/// 内存实现的身份存储（用于测试和本地开发）
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct InMemoryUserRepository {
        users: RwLock<HashMap<UserId, User>>,
    }

    impl InMemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// 直接删除用户，模拟外部删除
        pub async fn remove(&self, id: UserId) -> Option<User> {
            self.users.write().await.remove(&id)
        }

        pub async fn len(&self) -> usize {
            self.users.read().await.len()
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn create(&self, user: User) -> Result<User, RepositoryError> {
            let mut users = self.users.write().await;
            if users.values().any(|existing| existing.email == user.email) {
                return Err(RepositoryError::Conflict);
            }
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            Ok(self.users.read().await.get(&id).cloned())
        }

        async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|user| user.email == email)
                .cloned())
        }

        async fn update_profile(
            &self,
            id: UserId,
            update: ProfileUpdate,
        ) -> Result<User, RepositoryError> {
            let mut users = self.users.write().await;
            let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
            user.update_profile(update.fullname, update.avatar_url, update.updated_at);
            Ok(user.clone())
        }

        async fn search_by_fullname(
            &self,
            fragment: String,
            exclude: UserId,
        ) -> Result<Vec<User>, RepositoryError> {
            let needle = fragment.to_lowercase();
            let mut found: Vec<User> = self
                .users
                .read()
                .await
                .values()
                .filter(|user| user.id != exclude)
                .filter(|user| user.fullname.as_str().to_lowercase().contains(&needle))
                .cloned()
                .collect();
            found.sort_by(|a, b| a.fullname.as_str().cmp(b.fullname.as_str()));
            Ok(found)
        }
    }
}
