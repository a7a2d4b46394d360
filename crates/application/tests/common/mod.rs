//! 集成测试共用的假实现与构造函数

#![allow(dead_code)]

use std::sync::Arc;

use application::{
    clock::ManualClock, denylist::memory::InMemoryTokenDenylist,
    repository::memory::InMemoryUserRepository, AuthService, AuthServiceDependencies,
    PasswordHasher, PasswordHasherError, TokenDenylist, TokenIssuer,
};
use async_trait::async_trait;
use config::JwtConfig;
use domain::PasswordHash;
use time::OffsetDateTime;

/// 明文前缀"哈希"，仅用于测试
pub struct PlainHasher;

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("plain:{plaintext}"))
            .map_err(|err| PasswordHasherError::hash_error(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("plain:{plaintext}"))
    }
}

pub fn jwt_config(revoke_on_logout: bool) -> JwtConfig {
    JwtConfig {
        access_token_secret: "integration-access-secret-0123456789abcdef".into(),
        refresh_token_secret: "integration-refresh-secret-0123456789abcdef".into(),
        access_token_ttl_seconds: 150,
        refresh_token_ttl_seconds: 7 * 24 * 60 * 60,
        revoke_on_logout,
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub users: Arc<InMemoryUserRepository>,
    pub issuer: Arc<TokenIssuer>,
    pub denylist: Option<Arc<dyn TokenDenylist>>,
    pub auth: AuthService,
}

impl Harness {
    pub fn new(revoke_on_logout: bool) -> Self {
        let clock = Arc::new(ManualClock::new(OffsetDateTime::now_utc()));
        let users = Arc::new(InMemoryUserRepository::new());
        let issuer = Arc::new(TokenIssuer::new(&jwt_config(revoke_on_logout), clock.clone()));
        let denylist: Option<Arc<dyn TokenDenylist>> = revoke_on_logout
            .then(|| Arc::new(InMemoryTokenDenylist::new(clock.clone())) as Arc<dyn TokenDenylist>);

        let auth = AuthService::new(AuthServiceDependencies {
            user_repository: users.clone(),
            password_hasher: Arc::new(PlainHasher),
            token_issuer: issuer.clone(),
            clock: clock.clone(),
            denylist: denylist.clone(),
        });

        Self {
            clock,
            users,
            issuer,
            denylist,
            auth,
        }
    }
}
