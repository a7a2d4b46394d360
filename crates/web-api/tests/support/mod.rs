//! 测试用应用：内存身份存储、内存在线集合、进程内广播，服务监听随机端口

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use application::{
    clock::ManualClock, denylist::memory::InMemoryTokenDenylist,
    presence::memory::MemoryPresenceStore, repository::memory::InMemoryUserRepository,
    AuthService, AuthServiceDependencies, Clock, LocalPresenceBroker, PresenceService,
    PresenceServiceDependencies, SessionGate, TokenDenylist, TokenIssuer, UserService,
    UserServiceDependencies,
};
use config::JwtConfig;
use infrastructure::BcryptPasswordHasher;
use reqwest::{header, Client, Response};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tokio::{net::TcpListener, sync::oneshot};
use web_api::{router, AppState, CookieSettings};

pub struct TestApp {
    pub addr: SocketAddr,
    pub clock: Arc<ManualClock>,
    pub client: Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    pub async fn register(&self, fullname: &str, email: &str) -> (Value, Cookies) {
        let response = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({
                "fullname": fullname,
                "email": email,
                "password": "p4ssw0rd!",
                "confirmPassword": "p4ssw0rd!"
            }))
            .send()
            .await
            .expect("register request");
        assert_eq!(response.status(), 201);
        let cookies = Cookies::from_response(&response);
        (response.json().await.expect("register json"), cookies)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub fn jwt_config(revoke_on_logout: bool) -> JwtConfig {
    JwtConfig {
        access_token_secret: "web-test-access-secret-0123456789abcdef".into(),
        refresh_token_secret: "web-test-refresh-secret-0123456789abcdef".into(),
        access_token_ttl_seconds: 150,
        refresh_token_ttl_seconds: 7 * 24 * 60 * 60,
        revoke_on_logout,
    }
}

pub fn build_state(revoke_on_logout: bool, clock: Arc<ManualClock>) -> AppState {
    let users = Arc::new(InMemoryUserRepository::new());
    let issuer = Arc::new(TokenIssuer::new(&jwt_config(revoke_on_logout), clock.clone()));
    let denylist: Option<Arc<dyn TokenDenylist>> = revoke_on_logout
        .then(|| Arc::new(InMemoryTokenDenylist::new(clock.clone())) as Arc<dyn TokenDenylist>);
    let clock_dyn: Arc<dyn Clock> = clock;

    let auth_service = AuthService::new(AuthServiceDependencies {
        user_repository: users.clone(),
        password_hasher: Arc::new(BcryptPasswordHasher::new(Some(4))),
        token_issuer: issuer.clone(),
        clock: clock_dyn.clone(),
        denylist: denylist.clone(),
    });
    let user_service = UserService::new(UserServiceDependencies {
        user_repository: users.clone(),
        clock: clock_dyn,
    });
    let presence_service = PresenceService::new(PresenceServiceDependencies {
        user_repository: users,
        presence_store: Arc::new(MemoryPresenceStore::new()),
        notifier: Arc::new(LocalPresenceBroker::new(64)),
    });

    AppState::new(
        Arc::new(auth_service),
        Arc::new(user_service),
        Arc::new(presence_service),
        SessionGate::new(issuer, denylist),
        CookieSettings::default(),
    )
}

pub async fn spawn_app(revoke_on_logout: bool) -> TestApp {
    let clock = Arc::new(ManualClock::new(OffsetDateTime::now_utc()));
    let app = router(build_state(revoke_on_logout, clock.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    TestApp {
        addr,
        clock,
        client: Client::new(),
        shutdown: Some(shutdown_tx),
    }
}

/// 手工维护的 cookie 集合；reqwest 未开启 cookie 特性
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    pub values: HashMap<String, String>,
    pub attributes: HashMap<String, String>,
}

impl Cookies {
    pub fn from_response(response: &Response) -> Self {
        let mut cookies = Self::default();
        cookies.absorb(response);
        cookies
    }

    /// 合并响应中的 Set-Cookie；空值视为删除
    pub fn absorb(&mut self, response: &Response) {
        for raw in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = raw.to_str() else { continue };
            let pair = raw.split(';').next().unwrap_or(raw);
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let (name, value) = (name.trim().to_owned(), value.trim().to_owned());
            self.attributes.insert(name.clone(), raw.to_owned());
            if value.is_empty() {
                self.values.remove(&name);
            } else {
                self.values.insert(name, value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn header(&self) -> String {
        self.values
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
