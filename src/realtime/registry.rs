//! Process-wide channel membership.
//!
//! A channel is keyed by user id and may hold several live connections. The
//! registry is owned by the server state and shared by `Arc`; nothing here is
//! a global. Membership is held through [`Membership`] guards, so dropping a
//! connection's guards is the only way it leaves a channel.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::models::UserId;

use super::events::ServerEvent;

pub type ConnectionId = u64;
pub type Outbox = mpsc::Sender<ServerEvent>;

/// Events a connection may have queued before further pushes to it are dropped.
pub const OUTBOX_CAPACITY: usize = 64;

pub fn outbox() -> (Outbox, mpsc::Receiver<ServerEvent>) {
    mpsc::channel(OUTBOX_CAPACITY)
}

#[derive(Default)]
pub struct ChannelRegistry {
    channels: DashMap<UserId, HashMap<ConnectionId, Outbox>>,
    next_connection: AtomicU64,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }

    pub fn join(self: &Arc<Self>, channel: UserId, connection: ConnectionId, outbox: Outbox) -> Membership {
        self.channels
            .entry(channel)
            .or_default()
            .insert(connection, outbox);

        Membership {
            registry: Arc::clone(self),
            channel,
            connection,
        }
    }

    fn leave(&self, channel: UserId, connection: ConnectionId) {
        // the shard guard must be gone before remove_if takes it again
        if let Some(mut members) = self.channels.get_mut(&channel) {
            members.remove(&connection);
        }
        self.channels.remove_if(&channel, |_, members| members.is_empty());
    }

    pub fn is_bound(&self, channel: UserId) -> bool {
        self.connection_count(channel) > 0
    }

    pub fn connection_count(&self, channel: UserId) -> usize {
        self.channels.get(&channel).map_or(0, |members| members.len())
    }

    /// Hands `event` to every live connection on `channel`; returns how many accepted it.
    /// A connection whose outbox is full misses the event.
    pub fn push(&self, channel: UserId, event: &ServerEvent) -> usize {
        let Some(members) = self.channels.get(&channel) else {
            return 0;
        };

        members
            .iter()
            .filter(|(connection, outbox)| match outbox.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(%channel, connection = **connection, "outbox full, event dropped");
                    false
                }
                Err(TrySendError::Closed(_)) => false,
            })
            .count()
    }
}

/// One connection's seat in one channel. Leaves on drop.
pub struct Membership {
    registry: Arc<ChannelRegistry>,
    channel: UserId,
    connection: ConnectionId,
}

impl Membership {
    pub fn channel(&self) -> UserId {
        self.channel
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        self.registry.leave(self.channel, self.connection);
    }
}
