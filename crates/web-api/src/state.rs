use std::sync::Arc;

use application::{AuthService, PresenceService, SessionGate, UserService};

use crate::auth::CookieSettings;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub presence_service: Arc<PresenceService>,
    pub session_gate: SessionGate,
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        user_service: Arc<UserService>,
        presence_service: Arc<PresenceService>,
        session_gate: SessionGate,
        cookies: CookieSettings,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            presence_service,
            session_gate,
            cookies,
        }
    }
}
