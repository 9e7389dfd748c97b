use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    models::{Message, UserId},
    AppResult,
};

/// Append-only message log.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append(&self, message: Message) -> AppResult<Message>;

    /// Every message `user` sent or received, in log order.
    async fn involving(&self, user: UserId) -> AppResult<Vec<Message>>;

    /// The thread between two users, oldest first.
    async fn between(&self, user: UserId, other: UserId) -> AppResult<Vec<Message>>;
}

type MessageRow = (String, String, String, String, i64);

#[derive(Clone)]
pub struct SqliteMessageStore {
    db_pool: SqlitePool,
}

impl SqliteMessageStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn append(&self, message: Message) -> AppResult<Message> {
        sqlx::query("INSERT INTO messages (id,sender_id,receiver_id,content,timestamp) VALUES (?,?,?,?,?)")
            .bind(message.id.to_string())
            .bind(message.sender_id.to_string())
            .bind(message.receiver_id.to_string())
            .bind(&message.content)
            .bind(message.timestamp)
            .execute(&self.db_pool)
            .await?;

        Ok(message)
    }

    async fn involving(&self, user: UserId) -> AppResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id,sender_id,receiver_id,content,timestamp FROM messages WHERE sender_id=? OR receiver_id=? ORDER BY rowid",
        )
        .bind(user.to_string())
        .bind(user.to_string())
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows.into_iter().filter_map(message_from_row).collect())
    }

    async fn between(&self, user: UserId, other: UserId) -> AppResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id,sender_id,receiver_id,content,timestamp FROM messages
             WHERE (sender_id=? AND receiver_id=?) OR (sender_id=? AND receiver_id=?)
             ORDER BY timestamp, id",
        )
        .bind(user.to_string())
        .bind(other.to_string())
        .bind(other.to_string())
        .bind(user.to_string())
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows.into_iter().filter_map(message_from_row).collect())
    }
}

fn message_from_row((id, sender_id, receiver_id, content, timestamp): MessageRow) -> Option<Message> {
    let (Ok(id), Ok(sender_id), Ok(receiver_id)) = (
        Uuid::parse_str(&id),
        Uuid::parse_str(&sender_id),
        Uuid::parse_str(&receiver_id),
    ) else {
        tracing::warn!(%id, "skipping unreadable message record");
        return None;
    };

    Some(Message { id, sender_id, receiver_id, content, timestamp })
}
