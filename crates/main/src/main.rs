//! 主应用程序入口
//!
//! 加载配置、连接外部依赖并启动 Axum Web API 服务。

use std::sync::Arc;

use application::{
    AuthService, AuthServiceDependencies, Clock, LocalPresenceBroker, PresenceService,
    PresenceServiceDependencies, SessionGate, SystemClock, TokenIssuer, UserService,
    UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::Infrastructure;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, CookieSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    // 校验失败直接退出，开发密钥需显式设置 ALLOW_DEV_SECRETS
    config.validate()?;
    if config.server.allow_dev_secrets {
        tracing::warn!("已允许开发密钥，请勿在生产环境使用当前配置");
    }
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        presence_redis = config.presence.use_redis,
        revoke_on_logout = config.jwt.revoke_on_logout,
        "配置加载完成"
    );

    let infrastructure = Infrastructure::connect(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let token_issuer = Arc::new(TokenIssuer::new(&config.jwt, clock.clone()));
    let denylist = infrastructure.token_denylist(clock.clone());
    let broker = Arc::new(LocalPresenceBroker::new(config.broadcast.capacity));

    let auth_service = AuthService::new(AuthServiceDependencies {
        user_repository: infrastructure.user_repository_trait(),
        password_hasher: infrastructure.password_hasher_trait(),
        token_issuer: token_issuer.clone(),
        clock: clock.clone(),
        denylist: denylist.clone(),
    });

    let user_service = UserService::new(UserServiceDependencies {
        user_repository: infrastructure.user_repository_trait(),
        clock,
    });

    let presence_service = PresenceService::new(PresenceServiceDependencies {
        user_repository: infrastructure.user_repository_trait(),
        presence_store: infrastructure.presence_store(),
        notifier: broker,
    });

    let state = AppState::new(
        Arc::new(auth_service),
        Arc::new(user_service),
        Arc::new(presence_service),
        SessionGate::new(token_issuer, denylist),
        CookieSettings::from(&config.server),
    );

    // 启动 Web 服务器
    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("聊天室服务器启动在 http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
