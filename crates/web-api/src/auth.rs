//! cookie 会话载体与鉴权提取器
//!
//! 两个令牌都放在 HttpOnly cookie 中，前端脚本无法读取。

use application::{SessionArtifact, SessionCarrier};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use config::ServerConfig;
use domain::SessionClaim;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    /// 仅 HTTPS 下发送
    pub secure: bool,
}

impl From<&ServerConfig> for CookieSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            secure: config.secure_cookies,
        }
    }
}

/// 请求 cookie 的读取与响应 cookie 的写入
pub struct CookieCarrier {
    jar: CookieJar,
    settings: CookieSettings,
}

impl CookieCarrier {
    pub fn new(jar: CookieJar, settings: CookieSettings) -> Self {
        Self { jar, settings }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }

    fn base_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.settings.secure)
            .build()
    }
}

impl SessionCarrier for CookieCarrier {
    fn artifact(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|cookie| cookie.value().to_owned())
    }

    fn set_artifact(&mut self, artifact: SessionArtifact) {
        let mut cookie = self.base_cookie(artifact.name, artifact.value);
        cookie.set_max_age(time::Duration::seconds(artifact.max_age_seconds));
        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }

    fn clear_artifact(&mut self, name: &'static str) {
        let cookie = self.base_cookie(name, String::new());
        self.jar = std::mem::take(&mut self.jar).remove(cookie);
    }
}

/// 通过鉴权关卡的调用方
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionClaim);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let carrier = CookieCarrier::new(CookieJar::from_headers(&parts.headers), state.cookies);
        let claim = state.session_gate.authorize(&carrier).await?;
        Ok(CurrentUser(claim))
    }
}
