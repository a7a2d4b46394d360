//! 访问令牌 / 刷新令牌的签发与校验
//!
//! 两种令牌使用各自独立的 HS256 密钥和有效期。签发器无状态，不记录已签发的令牌；
//! 过期判断基于注入的 [`Clock`]，不使用 `jsonwebtoken` 自带的系统时间校验和宽限期。

use std::sync::Arc;

use config::JwtConfig;
use domain::{ClaimSubject, SessionClaim, TokenKind};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// 签名不匹配或令牌结构无效
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// 签发结果
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub kind: TokenKind,
    pub token: String,
    pub claim: SessionClaim,
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl SigningKey {
    fn from_secret(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }
}

/// JWT Token 服务
pub struct TokenIssuer {
    access: SigningKey,
    refresh: SigningKey,
    clock: Arc<dyn Clock>,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            access: SigningKey::from_secret(
                &config.access_token_secret,
                config.access_token_ttl_seconds,
            ),
            refresh: SigningKey::from_secret(
                &config.refresh_token_secret,
                config.refresh_token_ttl_seconds,
            ),
            clock,
            validation,
        }
    }

    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn ttl_seconds(&self, kind: TokenKind) -> i64 {
        self.key(kind).ttl_seconds
    }

    /// 签发令牌：exp = now + ttl(kind)，每次生成新的 jti
    pub fn issue(&self, subject: &ClaimSubject, kind: TokenKind) -> Result<IssuedToken, TokenError> {
        let key = self.key(kind);
        let now = self.clock.unix_now();
        let claim = SessionClaim {
            sub: subject.user_id,
            username: subject.username.clone(),
            iat: now,
            exp: now + key.ttl_seconds,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claim, &key.encoding)
            .map_err(|err| TokenError::Encoding(err.to_string()))?;

        Ok(IssuedToken { kind, token, claim })
    }

    /// 校验签名后再判断过期，伪造的过期令牌报告为签名错误
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<SessionClaim, TokenError> {
        let claim = decode::<SessionClaim>(token, &self.key(kind).decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            })?;

        if claim.is_expired_at(self.clock.unix_now()) {
            return Err(TokenError::Expired);
        }

        Ok(claim)
    }
}
