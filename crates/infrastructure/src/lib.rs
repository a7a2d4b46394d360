//! 基础设施层实现。
//!
//! 提供 PostgreSQL 身份存储、bcrypt 密码哈希、Redis 在线集合与令牌黑名单等适配器，
//! 实现应用层定义的接口。

pub mod builder;
pub mod denylist;
pub mod password;
pub mod presence_storage;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureError};
pub use denylist::RedisTokenDenylist;
pub use password::BcryptPasswordHasher;
pub use presence_storage::RedisPresenceStore;
pub use repository::{create_pg_pool, PgUserRepository};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
