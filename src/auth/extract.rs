use axum::{extract::{FromRef, FromRequestParts}, http::request::Parts};
use tower_sessions::Session;

use crate::{models::UserId, AppError};

use super::{bearer_token, TokenVerifier, USER_ID};

/// The caller, from the cookie session or else a bearer token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    TokenVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            if let Some(user_id) = session.get::<UserId>(USER_ID).await? {
                return Ok(CurrentUser(user_id));
            }
        }

        let Some(token) = bearer_token(&parts.headers) else {
            return Err(AppError::Authentication("missing credentials".into()));
        };

        Ok(CurrentUser(TokenVerifier::from_ref(state).verify(token)?))
    }
}
