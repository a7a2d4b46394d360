use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;

        match error {
            AppErr::InvalidInput { field, message } => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                format!("{field}: {message}"),
            ),
            AppErr::InvalidCredentials => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_CREDENTIALS",
                "Invalid credentials",
            ),
            AppErr::Conflict(message) => ApiError::new(StatusCode::CONFLICT, "CONFLICT", message),
            AppErr::Unauthorized => ApiError::unauthorized(),
            AppErr::NotFound(message) => ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
            // 内部故障只记日志，不把细节返回给客户端
            other => {
                tracing::error!(error = %other, "request failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::RepositoryError;

    #[test]
    fn business_errors_map_to_client_statuses() {
        let cases = [
            (ApplicationError::invalid_input("email", "bad"), StatusCode::BAD_REQUEST),
            (ApplicationError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (ApplicationError::Conflict("taken".into()), StatusCode::CONFLICT),
            (ApplicationError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApplicationError::NotFound("gone".into()), StatusCode::NOT_FOUND),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn internal_failures_hide_details() {
        let err = ApiError::from(ApplicationError::Repository(RepositoryError::storage(
            "connection refused",
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.message, "internal server error");
    }
}
