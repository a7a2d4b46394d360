//! Redis 令牌黑名单
//!
//! 键的过期时间与令牌剩余有效期一致，Redis 自动清理。

use std::sync::Arc;

use application::{Clock, ApplicationError, TokenDenylist};
use async_trait::async_trait;
use redis::aio::ConnectionManager;

const DENYLIST_PREFIX: &str = "token_blacklist:";

#[derive(Clone)]
pub struct RedisTokenDenylist {
    connection: ConnectionManager,
    clock: Arc<dyn Clock>,
}

impl RedisTokenDenylist {
    pub fn new(connection: ConnectionManager, clock: Arc<dyn Clock>) -> Self {
        Self { connection, clock }
    }

    fn key(jti: &str) -> String {
        format!("{DENYLIST_PREFIX}{jti}")
    }
}

#[async_trait]
impl TokenDenylist for RedisTokenDenylist {
    async fn revoke(&self, jti: &str, expires_at_unix: i64) -> Result<(), ApplicationError> {
        let ttl = expires_at_unix - self.clock.unix_now();
        if ttl <= 0 {
            tracing::debug!(jti, "token already expired, skipping denylist");
            return Ok(());
        }

        let mut conn = self.connection.clone();
        redis::cmd("SETEX")
            .arg(Self::key(jti))
            .arg(ttl)
            .arg("1")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|err| {
                ApplicationError::infrastructure_with_source("failed to revoke token", err)
            })?;

        tracing::info!(jti, ttl, "令牌已加入黑名单");
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, ApplicationError> {
        let mut conn = self.connection.clone();
        redis::cmd("EXISTS")
            .arg(Self::key(jti))
            .query_async::<bool>(&mut conn)
            .await
            .map_err(|err| {
                ApplicationError::infrastructure_with_source("failed to check token denylist", err)
            })
    }
}
