//! 会话凭据载体与请求期鉴权关卡

use std::future::Future;
use std::sync::Arc;

use domain::{SessionClaim, TokenKind, ACCESS_TOKEN_COOKIE};

use crate::denylist::TokenDenylist;
use crate::error::ApplicationError;
use crate::token::TokenIssuer;

/// 写入载体的会话凭据，对客户端脚本不可见
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionArtifact {
    pub name: &'static str,
    pub value: String,
    pub max_age_seconds: i64,
}

/// 传输会话凭据的请求/响应载体（cookie 或等价物）
pub trait SessionCarrier: Send {
    fn artifact(&self, name: &str) -> Option<String>;
    fn set_artifact(&mut self, artifact: SessionArtifact);
    fn clear_artifact(&mut self, name: &'static str);
}

/// 鉴权关卡：只从会话凭据中读取访问令牌，任何校验失败都归为 `Unauthorized`
#[derive(Clone)]
pub struct SessionGate {
    issuer: Arc<TokenIssuer>,
    denylist: Option<Arc<dyn TokenDenylist>>,
}

impl SessionGate {
    pub fn new(issuer: Arc<TokenIssuer>, denylist: Option<Arc<dyn TokenDenylist>>) -> Self {
        Self { issuer, denylist }
    }

    /// 从载体读取访问令牌后校验；返回的 future 不借用载体
    pub fn authorize<C: SessionCarrier + ?Sized>(
        &self,
        carrier: &C,
    ) -> impl Future<Output = Result<SessionClaim, ApplicationError>> + Send + '_ {
        let token = carrier.artifact(ACCESS_TOKEN_COOKIE);
        self.authorize_token(token)
    }

    pub async fn authorize_token(
        &self,
        token: Option<String>,
    ) -> Result<SessionClaim, ApplicationError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(ApplicationError::Unauthorized)?;

        let claim = self
            .issuer
            .verify(&token, TokenKind::Access)
            .map_err(|err| {
                tracing::debug!(error = %err, "access token rejected");
                ApplicationError::Unauthorized
            })?;

        if let Some(denylist) = &self.denylist {
            match denylist.is_revoked(&claim.jti).await {
                Ok(false) => {}
                Ok(true) => return Err(ApplicationError::Unauthorized),
                Err(err) => {
                    tracing::warn!(error = %err, "denylist lookup failed");
                    return Err(ApplicationError::Unauthorized);
                }
            }
        }

        Ok(claim)
    }
}

/// 内存载体（用于测试）
pub mod memory {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Default, Clone)]
    pub struct MemoryCarrier {
        artifacts: HashMap<String, SessionArtifact>,
    }

    impl MemoryCarrier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_artifact(name: &'static str, value: impl Into<String>) -> Self {
            let mut carrier = Self::default();
            carrier.set_artifact(SessionArtifact {
                name,
                value: value.into(),
                max_age_seconds: 0,
            });
            carrier
        }

        pub fn get(&self, name: &str) -> Option<&SessionArtifact> {
            self.artifacts.get(name)
        }

        pub fn len(&self) -> usize {
            self.artifacts.len()
        }

        pub fn is_empty(&self) -> bool {
            self.artifacts.is_empty()
        }
    }

    impl SessionCarrier for MemoryCarrier {
        fn artifact(&self, name: &str) -> Option<String> {
            self.artifacts.get(name).map(|a| a.value.clone())
        }

        fn set_artifact(&mut self, artifact: SessionArtifact) {
            self.artifacts.insert(artifact.name.to_owned(), artifact);
        }

        fn clear_artifact(&mut self, name: &'static str) {
            self.artifacts.remove(name);
        }
    }
}
