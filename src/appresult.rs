use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not authenticated: {0}")]
    Authentication(String),

    #[error("not allowed: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

macro_rules! internal_from {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

internal_from!(serde_json::Error);
internal_from!(tower_sessions::session::Error);

// Extractor rejections are caller mistakes and answer in the same JSON shape as
// every other error instead of axum's plain-text 415/422.
macro_rules! validation_from {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(rejection: $E) -> Self {
                Self::Validation(rejection.body_text())
            }
        }
    };
}

validation_from!(JsonRejection);
validation_from!(PathRejection);
validation_from!(QueryRejection);

impl AppError {
    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            Validation(_) => StatusCode::BAD_REQUEST,
            Authentication(_) => StatusCode::UNAUTHORIZED,
            Authorization(_) => StatusCode::FORBIDDEN,
            NotFound(_) => StatusCode::NOT_FOUND,
            Store(_) | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        use AppError::*;
        match self {
            Validation(_) => "VALIDATION_ERROR",
            Authentication(_) => "AUTHENTICATION_ERROR",
            Authorization(_) => "AUTHORIZATION_ERROR",
            NotFound(_) => "NOT_FOUND",
            Store(_) => "STORE_ERROR",
            Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Store(err) => {
                tracing::error!(error = %err, "store call failed");
                "storage unavailable".to_owned()
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal error");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Authentication("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Authorization("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Store(sqlx::Error::PoolClosed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn body_rejections_become_validation_errors() {
        use axum::{body::Body, extract::FromRequest, http::Request};
        use http_body_util::BodyExt;

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"token":5}"#))
            .unwrap();
        let rejection = Json::<std::collections::HashMap<String, String>>::from_request(request, &())
            .await
            .unwrap_err();

        let response = AppError::from(rejection).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[test]
    fn store_errors_do_not_leak_detail() {
        let response = AppError::Store(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
