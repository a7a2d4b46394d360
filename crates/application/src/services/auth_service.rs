//! 认证用例：注册、登录、登出、刷新访问令牌
//!
//! 会话通过两个对脚本不可见的会话凭据下发：短期访问令牌和长期刷新令牌。
//! 刷新只重签访问令牌，刷新令牌本身在自然过期前保持有效。

use std::sync::Arc;

use domain::{
    ClaimSubject, FullName, TokenKind, User, UserEmail, UserId, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::{
    clock::Clock,
    denylist::TokenDenylist,
    error::ApplicationError,
    password::PasswordHasher,
    repository::UserRepository,
    services::credentials::CredentialValidator,
    session::{SessionArtifact, SessionCarrier},
    token::{IssuedToken, TokenIssuer},
};

pub const LOGOUT_CONFIRMATION: &str = "Successfully logout";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Fullname is required."))]
    pub fullname: String,
    #[validate(email(message = "Email must be valid."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Email must be valid."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// 把 validator 的错误收敛成单个字段错误，按字段名排序保证稳定
pub(crate) fn first_validation_error(errors: ValidationErrors) -> ApplicationError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    match fields.into_iter().next() {
        Some((field, errs)) => {
            let message = errs
                .first()
                .and_then(|err| err.message.as_ref())
                .map(|msg| msg.to_string())
                .unwrap_or_else(|| "invalid value".to_string());
            ApplicationError::invalid_input(field.to_string(), message)
        }
        None => ApplicationError::invalid_input("request", "invalid request"),
    }
}

pub struct AuthServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_issuer: Arc<TokenIssuer>,
    pub clock: Arc<dyn Clock>,
    /// 配置后登出会吊销当前令牌
    pub denylist: Option<Arc<dyn TokenDenylist>>,
}

pub struct AuthService {
    deps: AuthServiceDependencies,
    credentials: CredentialValidator,
}

impl AuthService {
    pub fn new(deps: AuthServiceDependencies) -> Self {
        let credentials =
            CredentialValidator::new(deps.user_repository.clone(), deps.password_hasher.clone());
        Self { deps, credentials }
    }

    pub async fn register<C: SessionCarrier + ?Sized>(
        &self,
        request: RegisterRequest,
        carrier: &mut C,
    ) -> Result<User, ApplicationError> {
        if request.password != request.confirm_password {
            return Err(ApplicationError::invalid_input(
                "confirmPassword",
                "Password and confirm password are not the same.",
            ));
        }
        request.validate().map_err(first_validation_error)?;

        let fullname = FullName::parse(request.fullname)?;
        let email = UserEmail::parse(request.email)?;

        if self
            .deps
            .user_repository
            .find_by_email(email.clone())
            .await?
            .is_some()
        {
            return Err(ApplicationError::Conflict("Email already in use".into()));
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let user = User::register(
            UserId::generate(),
            fullname,
            email,
            password_hash,
            self.deps.clock.now(),
        );

        // 并发注册同一邮箱时由存储层唯一约束兜底
        let stored = self
            .deps
            .user_repository
            .create(user)
            .await
            .map_err(|err| match ApplicationError::from(err) {
                ApplicationError::Conflict(_) => {
                    ApplicationError::Conflict("Email already in use".into())
                }
                other => other,
            })?;

        tracing::info!(user_id = %stored.id, "用户注册成功");
        self.issue_session(&stored, carrier)?;
        Ok(stored)
    }

    pub async fn login<C: SessionCarrier + ?Sized>(
        &self,
        request: LoginRequest,
        carrier: &mut C,
    ) -> Result<User, ApplicationError> {
        request
            .validate()
            .map_err(|_| ApplicationError::InvalidCredentials)?;

        let user = self
            .credentials
            .validate(&request.email, &request.password)
            .await?
            .ok_or(ApplicationError::InvalidCredentials)?;

        tracing::info!(user_id = %user.id, "用户登录");
        self.issue_session(&user, carrier)?;
        Ok(user)
    }

    /// 签发访问令牌和刷新令牌并写入载体
    pub fn issue_session<C: SessionCarrier + ?Sized>(
        &self,
        user: &User,
        carrier: &mut C,
    ) -> Result<(), ApplicationError> {
        let subject = ClaimSubject {
            user_id: user.id,
            username: user.fullname.as_str().to_owned(),
        };

        let access = self.deps.token_issuer.issue(&subject, TokenKind::Access)?;
        let refresh = self.deps.token_issuer.issue(&subject, TokenKind::Refresh)?;

        carrier.set_artifact(self.artifact(&access));
        carrier.set_artifact(self.artifact(&refresh));
        Ok(())
    }

    fn artifact(&self, issued: &IssuedToken) -> SessionArtifact {
        SessionArtifact {
            name: issued.kind.artifact_name(),
            value: issued.token.clone(),
            max_age_seconds: self.deps.token_issuer.ttl_seconds(issued.kind),
        }
    }

    /// 清除两个会话凭据。未配置黑名单时服务端不保留任何状态。
    ///
    /// 凭据总是先被清除；吊销失败只记录日志，登出本身仍然成功。
    pub async fn logout<C: SessionCarrier + ?Sized>(
        &self,
        carrier: &mut C,
    ) -> Result<&'static str, ApplicationError> {
        let presented: Vec<(TokenKind, String)> = [TokenKind::Access, TokenKind::Refresh]
            .into_iter()
            .filter_map(|kind| carrier.artifact(kind.artifact_name()).map(|t| (kind, t)))
            .collect();

        carrier.clear_artifact(ACCESS_TOKEN_COOKIE);
        carrier.clear_artifact(REFRESH_TOKEN_COOKIE);

        if let Some(denylist) = &self.deps.denylist {
            for (kind, token) in presented {
                // 已过期或无效的令牌不需要吊销
                let Ok(claim) = self.deps.token_issuer.verify(&token, kind) else {
                    continue;
                };
                match denylist.revoke(&claim.jti, claim.exp).await {
                    Ok(()) => {
                        tracing::debug!(user_id = %claim.sub, kind = %kind, "token revoked on logout");
                    }
                    Err(err) => {
                        tracing::warn!(
                            user_id = %claim.sub,
                            kind = %kind,
                            error = %err,
                            "failed to revoke token on logout"
                        );
                    }
                }
            }
        }

        Ok(LOGOUT_CONFIRMATION)
    }

    /// 用刷新令牌换取新的访问令牌，返回新令牌字符串
    pub async fn refresh<C: SessionCarrier + ?Sized>(
        &self,
        carrier: &mut C,
    ) -> Result<String, ApplicationError> {
        let token = carrier
            .artifact(REFRESH_TOKEN_COOKIE)
            .filter(|t| !t.is_empty())
            .ok_or(ApplicationError::Unauthorized)?;

        let claim = self
            .deps
            .token_issuer
            .verify(&token, TokenKind::Refresh)
            .map_err(|err| {
                tracing::debug!(error = %err, "refresh token rejected");
                ApplicationError::Unauthorized
            })?;

        if let Some(denylist) = &self.deps.denylist {
            match denylist.is_revoked(&claim.jti).await {
                Ok(false) => {}
                Ok(true) => return Err(ApplicationError::Unauthorized),
                Err(err) => {
                    tracing::warn!(user_id = %claim.sub, error = %err, "denylist lookup failed");
                    return Err(ApplicationError::Unauthorized);
                }
            }
        }

        if self
            .deps
            .user_repository
            .find_by_id(claim.sub)
            .await?
            .is_none()
        {
            return Err(ApplicationError::NotFound("User no longer exists".into()));
        }

        let access = self
            .deps
            .token_issuer
            .issue(&claim.subject(), TokenKind::Access)?;
        carrier.set_artifact(self.artifact(&access));

        tracing::debug!(user_id = %claim.sub, "access token refreshed");
        Ok(access.token)
    }
}
