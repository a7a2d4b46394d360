//! 应用层实现。
//!
//! 提供认证会话与房间在线状态的用例服务，处理输入校验，
//! 以及对外部适配器（身份存储、密码哈希、在线缓存、事件广播）的抽象。

pub mod clock;
pub mod denylist;
pub mod error;
pub mod notifier;
pub mod password;
pub mod presence;
pub mod repository;
pub mod services;
pub mod session;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use denylist::TokenDenylist;
pub use error::ApplicationError;
pub use notifier::{BroadcastError, LocalPresenceBroker, PresenceNotifier, PresenceStream};
pub use password::{PasswordHasher, PasswordHasherError};
pub use presence::PresenceStore;
pub use repository::{ProfileUpdate, UserRepository};
pub use services::{
    AuthService, AuthServiceDependencies, CredentialValidator, LoginRequest, PresenceService,
    PresenceServiceDependencies, RegisterRequest, UpdateProfileRequest, UserService,
    UserServiceDependencies, LOGOUT_CONFIRMATION,
};
pub use session::{SessionArtifact, SessionCarrier, SessionGate};
pub use token::{IssuedToken, TokenError, TokenIssuer};
