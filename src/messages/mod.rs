pub mod conversations;
pub mod service;
pub mod store;

use axum::{
    debug_handler,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    models::{Conversation, Message},
    AppResult, AppState,
};

pub use service::{MessageService, SendMessageRequest};
pub use store::{MessageStore, SqliteMessageStore};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(send))
        .route("/conversations", get(list_conversations))
        .route("/{user_id}", get(history))
}

#[debug_handler(state = AppState)]
async fn send(
    State(messages): State<MessageService>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let Json(request) = body?;
    let message = messages.send(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[debug_handler(state = AppState)]
async fn list_conversations(
    State(messages): State<MessageService>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<Conversation>>> {
    Ok(Json(messages.conversations(user_id).await?))
}

#[debug_handler(state = AppState)]
async fn history(
    State(messages): State<MessageService>,
    CurrentUser(user_id): CurrentUser,
    other: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Vec<Message>>> {
    let Path(other) = other?;
    Ok(Json(messages.history(user_id, other).await?))
}
