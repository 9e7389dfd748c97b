use std::sync::Arc;

use crate::models::{Message, UserId};

use super::{
    events::{OutgoingMessage, ServerEvent},
    registry::ChannelRegistry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to this many live connections. Nothing confirms the client saw it.
    Pushed(usize),
    /// No live connection on the receiver's channel.
    Skipped,
}

/// Best-effort live push. Durability belongs to the message store; nothing here retries,
/// acknowledges or de-duplicates.
#[derive(Clone)]
pub struct DeliveryRouter {
    channels: Arc<ChannelRegistry>,
}

impl DeliveryRouter {
    pub fn new(channels: Arc<ChannelRegistry>) -> Self {
        Self { channels }
    }

    pub fn deliver(&self, message: &Message) -> Delivery {
        self.push(message.receiver_id, ServerEvent::NewMessage(message.clone()))
    }

    /// Forwards a sender's echo to the receiver's channel, independent of any persisted copy.
    pub fn relay_echo(&self, sender_id: UserId, echo: OutgoingMessage) -> Delivery {
        let message = echo.into_echo(sender_id);
        self.push(message.receiver_id, ServerEvent::NewMessage(message))
    }

    fn push(&self, channel: UserId, event: ServerEvent) -> Delivery {
        if !self.channels.is_bound(channel) {
            tracing::debug!(%channel, "receiver offline, live push skipped");
            return Delivery::Skipped;
        }

        match self.channels.push(channel, &event) {
            0 => {
                tracing::debug!(%channel, "receiver went away before push");
                Delivery::Skipped
            }
            n => {
                tracing::debug!(%channel, connections = n, "pushed newMessage");
                Delivery::Pushed(n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{models::NewMessage, realtime::outbox};

    #[test]
    fn offline_receiver_is_skipped() {
        let router = DeliveryRouter::new(Arc::new(ChannelRegistry::new()));
        let message = NewMessage { sender_id: Uuid::now_v7(), receiver_id: Uuid::now_v7(), content: "hi".into() }
            .into_message(1);

        assert_eq!(router.deliver(&message), Delivery::Skipped);
    }

    #[test]
    fn online_receiver_gets_the_full_record() {
        let registry = Arc::new(ChannelRegistry::new());
        let router = DeliveryRouter::new(registry.clone());
        let receiver = Uuid::now_v7();
        let (tx, mut rx) = outbox();
        let _seat = registry.join(receiver, registry.next_connection_id(), tx);

        let message = NewMessage { sender_id: Uuid::now_v7(), receiver_id: receiver, content: "hi".into() }
            .into_message(5);
        assert_eq!(router.deliver(&message), Delivery::Pushed(1));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::NewMessage(message));
    }

    #[test]
    fn echo_and_canonical_push_both_arrive() {
        let registry = Arc::new(ChannelRegistry::new());
        let router = DeliveryRouter::new(registry.clone());
        let (sender, receiver) = (Uuid::now_v7(), Uuid::now_v7());
        let (tx, mut rx) = outbox();
        let _seat = registry.join(receiver, registry.next_connection_id(), tx);

        let message = NewMessage { sender_id: sender, receiver_id: receiver, content: "twice".into() }
            .into_message(9);
        router.relay_echo(
            sender,
            OutgoingMessage {
                receiver_id: receiver,
                content: message.content.clone(),
                id: Some(message.id),
                timestamp: Some(message.timestamp),
            },
        );
        router.deliver(&message);

        assert_eq!(rx.try_recv().unwrap(), ServerEvent::NewMessage(message.clone()));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::NewMessage(message));
    }
}
