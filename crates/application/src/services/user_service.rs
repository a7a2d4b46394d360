use std::sync::Arc;

use domain::{FullName, SessionClaim, User};
use serde::Deserialize;
use validator::Validate;

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{ProfileUpdate, UserRepository},
    services::auth_service::first_validation_error,
};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Fullname is required."))]
    pub fullname: String,
    /// 头像存储在外部，这里只记录引用地址
    #[validate(url(message = "Avatar url must be a valid url."))]
    pub avatar_url: Option<String>,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 资料读取、更新与按名称搜索。所有调用方都已经过鉴权关卡。
pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn me(&self, claim: &SessionClaim) -> Result<User, ApplicationError> {
        self.deps
            .user_repository
            .find_by_id(claim.sub)
            .await?
            .ok_or_else(|| ApplicationError::NotFound("User not found".into()))
    }

    pub async fn update_profile(
        &self,
        claim: &SessionClaim,
        request: UpdateProfileRequest,
    ) -> Result<User, ApplicationError> {
        request.validate().map_err(first_validation_error)?;

        let update = ProfileUpdate {
            fullname: FullName::parse(request.fullname)?,
            avatar_url: request.avatar_url,
            updated_at: self.deps.clock.now(),
        };

        let user = self
            .deps
            .user_repository
            .update_profile(claim.sub, update)
            .await?;
        tracing::info!(user_id = %user.id, "用户资料已更新");
        Ok(user)
    }

    /// 空白片段返回空结果
    pub async fn search_users(
        &self,
        claim: &SessionClaim,
        fullname: &str,
    ) -> Result<Vec<User>, ApplicationError> {
        let fragment = fullname.trim();
        if fragment.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .deps
            .user_repository
            .search_by_fullname(fragment.to_owned(), claim.sub)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::repository::memory::InMemoryUserRepository;
    use domain::{PasswordHash, UserEmail, UserId};
    use time::OffsetDateTime;

    async fn seed(repo: &InMemoryUserRepository, name: &str, email: &str) -> User {
        let user = User::register(
            UserId::generate(),
            FullName::parse(name).unwrap(),
            UserEmail::parse(email).unwrap(),
            PasswordHash::new("plain:x").unwrap(),
            OffsetDateTime::UNIX_EPOCH,
        );
        repo.create(user).await.unwrap()
    }

    fn claim_for(user: &User) -> SessionClaim {
        SessionClaim {
            sub: user.id,
            username: user.fullname.to_string(),
            iat: 0,
            exp: i64::MAX,
            jti: "test".into(),
        }
    }

    #[tokio::test]
    async fn search_excludes_caller_and_matches_case_insensitively() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let alice = seed(&repo, "Alice Smith", "alice@x.com").await;
        seed(&repo, "alice jones", "jones@x.com").await;
        seed(&repo, "Bob", "bob@x.com").await;

        let service = UserService::new(UserServiceDependencies {
            user_repository: repo,
            clock: Arc::new(ManualClock::default()),
        });

        let found = service
            .search_users(&claim_for(&alice), "ALICE")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fullname.as_str(), "alice jones");

        let none = service.search_users(&claim_for(&alice), "  ").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn update_profile_changes_name_and_avatar() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let alice = seed(&repo, "Alice", "alice@x.com").await;
        let service = UserService::new(UserServiceDependencies {
            user_repository: repo,
            clock: Arc::new(ManualClock::default()),
        });

        let updated = service
            .update_profile(
                &claim_for(&alice),
                UpdateProfileRequest {
                    fullname: "Alice Cooper".into(),
                    avatar_url: Some("https://cdn.example.com/images/a.png".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.fullname.as_str(), "Alice Cooper");
        assert_eq!(
            updated.avatar_url.as_deref(),
            Some("https://cdn.example.com/images/a.png")
        );
        assert_eq!(service.me(&claim_for(&alice)).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_profile_rejects_bad_avatar_url() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let alice = seed(&repo, "Alice", "alice@x.com").await;
        let service = UserService::new(UserServiceDependencies {
            user_repository: repo,
            clock: Arc::new(ManualClock::default()),
        });

        let err = service
            .update_profile(
                &claim_for(&alice),
                UpdateProfileRequest {
                    fullname: "Alice".into(),
                    avatar_url: Some("not a url".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidInput { field, .. } if field == "avatar_url"));
    }
}
