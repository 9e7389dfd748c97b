use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{AppResult, AppState};

use super::{TokenVerifier, USER_ID};

#[derive(Deserialize)]
pub struct BindSessionRequest {
    pub token: String,
}

/// Trades a credential token for a cookie session.
#[debug_handler(state = AppState)]
pub async fn bind_session(
    State(tokens): State<TokenVerifier>,
    session: Session,
    body: Result<Json<BindSessionRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(BindSessionRequest { token }) = body?;
    let user_id = tokens.verify(&token)?;

    session.cycle_id().await?;
    session.insert(USER_ID, user_id).await?;

    tracing::info!(%user_id, "session bound");
    Ok(StatusCode::NO_CONTENT)
}
