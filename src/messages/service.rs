use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    directory::IdentityDirectory,
    models::{now_millis, Conversation, Message, NewMessage, UserId},
    realtime::{Delivery, DeliveryRouter},
    AppError, AppResult,
};

use super::{conversations, store::MessageStore};

#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: Option<String>,
    pub content: Option<String>,
}

impl SendMessageRequest {
    fn validate(self, sender_id: UserId) -> AppResult<NewMessage> {
        let receiver_id = self
            .receiver_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::Validation("receiver_id is required".into()))?;
        let receiver_id = Uuid::parse_str(receiver_id.trim())
            .map_err(|_| AppError::Validation("receiver_id is not a user id".into()))?;

        let content = self
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Validation("content is required".into()))?;

        Ok(NewMessage { sender_id, receiver_id, content })
    }
}

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    identities: Arc<dyn IdentityDirectory>,
    delivery: DeliveryRouter,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        identities: Arc<dyn IdentityDirectory>,
        delivery: DeliveryRouter,
    ) -> Self {
        Self { store, identities, delivery }
    }

    /// Appends the message, then tries a live push.
    ///
    /// The push is a separate, fire-and-forget step: its outcome is only logged and
    /// never undoes the append. An offline receiver reads the message from history later.
    pub async fn send(&self, sender_id: UserId, request: SendMessageRequest) -> AppResult<Message> {
        let new_message = request.validate(sender_id)?;
        let message = self.store.append(new_message.into_message(now_millis())).await?;

        match self.delivery.deliver(&message) {
            Delivery::Pushed(n) => tracing::debug!(message_id = %message.id, connections = n, "message delivered live"),
            Delivery::Skipped => tracing::debug!(message_id = %message.id, "message stored for later"),
        }

        Ok(message)
    }

    pub async fn history(&self, user: UserId, other: UserId) -> AppResult<Vec<Message>> {
        self.store.between(user, other).await
    }

    pub async fn conversations(&self, user: UserId) -> AppResult<Vec<Conversation>> {
        let messages = self.store.involving(user).await?;
        conversations::aggregate(self.identities.as_ref(), user, &messages).await
    }
}
