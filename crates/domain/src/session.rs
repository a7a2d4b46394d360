//! 会话声明
//!
//! 签名令牌内嵌的身份字段。访问令牌与刷新令牌携带同一组字段，区别只在签名密钥和有效期。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// 访问令牌的 cookie 名称
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// 刷新令牌的 cookie 名称
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// 令牌种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// 承载该种令牌的会话凭据名称
    pub fn artifact_name(self) -> &'static str {
        match self {
            TokenKind::Access => ACCESS_TOKEN_COOKIE,
            TokenKind::Refresh => REFRESH_TOKEN_COOKIE,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// 签发前的身份字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSubject {
    pub user_id: UserId,
    pub username: String,
}

/// JWT Claims 结构，签发后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaim {
    /// 用户 ID
    pub sub: UserId,
    /// 签发时的显示名称
    pub username: String,
    /// 签发时间 (Unix timestamp)
    pub iat: i64,
    /// 过期时间 (Unix timestamp)
    pub exp: i64,
    /// 令牌 ID，用于吊销
    pub jti: String,
}

impl SessionClaim {
    pub fn subject(&self) -> ClaimSubject {
        ClaimSubject {
            user_id: self.sub,
            username: self.username.clone(),
        }
    }

    pub fn is_expired_at(&self, unix_now: i64) -> bool {
        unix_now > self.exp
    }
}
