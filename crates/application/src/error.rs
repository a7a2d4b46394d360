use std::error::Error as StdError;

use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::password::PasswordHasherError;
use crate::token::TokenError;

/// 应用层错误。前五种是面向调用方的业务错误，其余为内部故障。
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("invalid input {field}: {message}")]
    InvalidInput { field: String, message: String },
    #[error("conflict: {0}")]
    Conflict(String),
    /// 登录失败，不区分邮箱错误还是密码错误
    #[error("invalid credentials")]
    InvalidCredentials,
    /// 缺失、伪造或过期的会话凭据统一归为此类
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
    #[error("infrastructure error: {message}")]
    Infrastructure {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl ApplicationError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建基础设施错误
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure {
            message: message.into(),
            source: None,
        }
    }

    pub fn infrastructure_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Infrastructure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<DomainError> for ApplicationError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidArgument { field, reason } => Self::InvalidInput {
                field,
                message: reason,
            },
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ApplicationError::NotFound("record not found".into()),
            RepositoryError::Conflict => ApplicationError::Conflict("record already exists".into()),
            other => ApplicationError::Repository(other),
        }
    }
}
