use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{now_millis, Message, UserId};

/// Frames pushed to a client: `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "newMessage")]
    NewMessage(Message),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Sender-side mirror of a message, relayed as-is to the receiver.
    #[serde(rename = "outgoingMessage")]
    OutgoingMessage(OutgoingMessage),

    /// Explicit join by id. Binding now happens at handshake; kept for older clients.
    #[serde(rename = "join_chat")]
    JoinChat(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutgoingMessage {
    pub receiver_id: UserId,
    pub content: String,
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl OutgoingMessage {
    /// The relayed copy; the sender is always the authenticated subject, never the client's claim.
    pub fn into_echo(self, sender_id: UserId) -> Message {
        Message {
            id: self.id.unwrap_or_else(Uuid::now_v7),
            sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            timestamp: self.timestamp.unwrap_or_else(now_millis),
        }
    }
}
