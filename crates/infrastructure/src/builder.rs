use std::sync::Arc;

use application::{
    presence::memory::MemoryPresenceStore, Clock, PasswordHasher, PresenceStore, TokenDenylist,
    UserRepository,
};
use config::AppConfig;
use redis::aio::ConnectionManager;
use thiserror::Error;

use crate::{
    denylist::RedisTokenDenylist,
    password::BcryptPasswordHasher,
    presence_storage::RedisPresenceStore,
    repository::{create_pg_pool, PgUserRepository},
    MIGRATOR,
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// 启动时建立的外部连接与适配器
#[derive(Clone)]
pub struct Infrastructure {
    pub user_repository: Arc<PgUserRepository>,
    pub password_hasher: Arc<BcryptPasswordHasher>,
    redis: Option<ConnectionManager>,
    presence_use_redis: bool,
    presence_ttl_seconds: u64,
    revoke_on_logout: bool,
}

impl Infrastructure {
    /// 连接数据库并执行迁移；只有在线集合或令牌黑名单需要时才连接 Redis
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;
        MIGRATOR.run(&pool).await?;
        tracing::info!("数据库迁移完成");

        let redis = if config.presence.use_redis || config.jwt.revoke_on_logout {
            let client = redis::Client::open(config.redis.url.as_str())?;
            let manager = client.get_connection_manager().await?;
            tracing::info!("Redis 连接已建立");
            Some(manager)
        } else {
            None
        };

        Ok(Self {
            user_repository: Arc::new(PgUserRepository::new(pool)),
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.server.bcrypt_cost)),
            redis,
            presence_use_redis: config.presence.use_redis,
            presence_ttl_seconds: config.presence.ttl_seconds,
            revoke_on_logout: config.jwt.revoke_on_logout,
        })
    }

    pub fn user_repository_trait(&self) -> Arc<dyn UserRepository> {
        self.user_repository.clone()
    }

    pub fn password_hasher_trait(&self) -> Arc<dyn PasswordHasher> {
        self.password_hasher.clone()
    }

    /// 启用 Redis 时使用共享存储，否则退回进程内存储
    pub fn presence_store(&self) -> Arc<dyn PresenceStore> {
        match self.redis.as_ref().filter(|_| self.presence_use_redis) {
            Some(conn) => Arc::new(RedisPresenceStore::new(
                conn.clone(),
                self.presence_ttl_seconds,
            )),
            None => {
                tracing::warn!("未启用 Redis，在线状态仅在当前进程内可见");
                Arc::new(MemoryPresenceStore::new())
            }
        }
    }

    /// 仅在开启登出吊销时返回黑名单
    pub fn token_denylist(&self, clock: Arc<dyn Clock>) -> Option<Arc<dyn TokenDenylist>> {
        self.redis
            .as_ref()
            .filter(|_| self.revoke_on_logout)
            .map(|conn| Arc::new(RedisTokenDenylist::new(conn.clone(), clock)) as Arc<dyn TokenDenylist>)
    }
}
