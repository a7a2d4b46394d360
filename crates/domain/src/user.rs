use serde::{Deserialize, Serialize};

use crate::value_objects::{FullName, PasswordHash, Timestamp, UserEmail, UserId};

/// 用户身份。由身份存储持有，核心逻辑只读取（注册时创建一次）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub fullname: FullName,
    pub email: UserEmail,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password: PasswordHash,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: Timestamp,
}

impl User {
    pub fn register(
        id: UserId,
        fullname: FullName,
        email: UserEmail,
        password: PasswordHash,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            fullname,
            email,
            password,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 更新资料；头像为 `None` 时保留原值。
    pub fn update_profile(
        &mut self,
        fullname: FullName,
        avatar_url: Option<String>,
        now: Timestamp,
    ) {
        self.fullname = fullname;
        if let Some(url) = avatar_url {
            self.avatar_url = Some(url);
        }
        self.updated_at = now;
    }

    /// 进入房间时拷贝的身份快照，不含密码哈希。
    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id,
            fullname: self.fullname.as_str().to_owned(),
            email: self.email.as_str().to_owned(),
            avatar_url: self.avatar_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// 在线集合中保存的用户快照，是进入房间那一刻的副本而非实时引用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: UserId,
    pub fullname: String,
    pub email: String,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: Timestamp,
}
