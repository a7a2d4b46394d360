use async_trait::async_trait;

use crate::error::ApplicationError;

/// 令牌黑名单，按 jti 记录，保留到令牌自然过期为止
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenDenylist: Send + Sync {
    async fn revoke(&self, jti: &str, expires_at_unix: i64) -> Result<(), ApplicationError>;
    async fn is_revoked(&self, jti: &str) -> Result<bool, ApplicationError>;
}

/// 内存中的令牌黑名单（用于测试）
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::clock::Clock;

    pub struct InMemoryTokenDenylist {
        entries: RwLock<HashMap<String, i64>>,
        clock: Arc<dyn Clock>,
    }

    impl InMemoryTokenDenylist {
        pub fn new(clock: Arc<dyn Clock>) -> Self {
            Self {
                entries: RwLock::new(HashMap::new()),
                clock,
            }
        }

        /// 清理过期条目
        async fn cleanup(&self) {
            let now = self.clock.unix_now();
            self.entries
                .write()
                .await
                .retain(|_, expires_at| *expires_at >= now);
        }
    }

    #[async_trait]
    impl TokenDenylist for InMemoryTokenDenylist {
        async fn revoke(&self, jti: &str, expires_at_unix: i64) -> Result<(), ApplicationError> {
            self.cleanup().await;
            if expires_at_unix < self.clock.unix_now() {
                return Ok(());
            }
            self.entries
                .write()
                .await
                .insert(jti.to_owned(), expires_at_unix);
            tracing::debug!(jti, "token added to in-memory denylist");
            Ok(())
        }

        async fn is_revoked(&self, jti: &str) -> Result<bool, ApplicationError> {
            self.cleanup().await;
            Ok(self.entries.read().await.contains_key(jti))
        }
    }

}
