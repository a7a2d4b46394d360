use std::sync::Arc;

use domain::{User, UserEmail};

use crate::{error::ApplicationError, password::PasswordHasher, repository::UserRepository};

/// 邮箱 + 密码校验，无副作用
pub struct CredentialValidator {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl CredentialValidator {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
        }
    }

    /// 仅在密码匹配时返回用户；邮箱格式不合法视同不存在
    pub async fn validate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, ApplicationError> {
        let Ok(email) = UserEmail::parse(email) else {
            return Ok(None);
        };

        let Some(user) = self.user_repository.find_by_email(email).await? else {
            return Ok(None);
        };

        if self.password_hasher.verify(password, &user.password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}
