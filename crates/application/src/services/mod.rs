mod auth_service;
mod credentials;
mod presence_service;
mod user_service;

pub use auth_service::{
    AuthService, AuthServiceDependencies, LoginRequest, RegisterRequest, LOGOUT_CONFIRMATION,
};
pub use credentials::CredentialValidator;
pub use presence_service::{PresenceService, PresenceServiceDependencies};
pub use user_service::{UpdateProfileRequest, UserService, UserServiceDependencies};
