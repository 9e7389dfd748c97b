//! Handshake authentication and channel binding for realtime connections.
//!
//! A connection walks `Connecting -> Authenticated -> Bound -> Closed`, each
//! step a distinct type so a half-bound connection cannot be expressed:
//!
//! * [`SessionGateway::authenticate`] consumes the handshake. Any credential
//!   problem rejects it on the spot; nothing is registered.
//! * [`AuthenticatedConnection::bind`] joins the subject's own channel.
//! * [`BoundConnection::close`] (or dropping it) releases every membership.
//!
//! `join_chat` lets a bound connection listen on further channels. Under
//! [`JoinPolicy::Open`] any id may be joined, so a signed-in client can receive
//! pushes addressed to someone else; [`JoinPolicy::OwnChannelOnly`] refuses
//! every channel but the subject's own.

use std::{collections::HashSet, str::FromStr, sync::Arc};

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::{auth::{self, TokenVerifier}, models::UserId, AppError, AppResult};

use super::{
    delivery::{Delivery, DeliveryRouter},
    events::ClientEvent,
    registry::{ChannelRegistry, ConnectionId, Membership, Outbox},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticated,
    Bound,
    Closed,
}

/// What the client presented when opening the socket.
#[derive(Debug, Default, Clone)]
pub struct Handshake {
    pub token: Option<String>,
}

impl Handshake {
    /// Prefers the `token` query parameter, falling back to a bearer header.
    pub fn new(query_token: Option<String>, headers: &HeaderMap) -> Self {
        let token = query_token
            .filter(|token| !token.trim().is_empty())
            .or_else(|| auth::bearer_token(headers).map(str::to_owned));
        Self { token }
    }

}

/// Which channels `join_chat` may add to a connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    #[default]
    Open,
    OwnChannelOnly,
}

impl FromStr for JoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(JoinPolicy::Open),
            "own" => Ok(JoinPolicy::OwnChannelOnly),
            other => Err(format!("unknown join policy `{other}`")),
        }
    }
}

#[derive(Clone)]
pub struct SessionGateway {
    tokens: TokenVerifier,
    channels: Arc<ChannelRegistry>,
    delivery: DeliveryRouter,
    join_policy: JoinPolicy,
}

impl SessionGateway {
    pub fn new(tokens: TokenVerifier, channels: Arc<ChannelRegistry>) -> Self {
        let delivery = DeliveryRouter::new(channels.clone());
        Self { tokens, channels, delivery, join_policy: JoinPolicy::default() }
    }

    pub fn with_join_policy(mut self, join_policy: JoinPolicy) -> Self {
        self.join_policy = join_policy;
        self
    }

    pub fn channels(&self) -> &Arc<ChannelRegistry> {
        &self.channels
    }

    pub fn delivery(&self) -> &DeliveryRouter {
        &self.delivery
    }

    pub fn authenticate(&self, handshake: &Handshake) -> AppResult<AuthenticatedConnection> {
        let Some(token) = handshake.token.as_deref() else {
            tracing::warn!("realtime handshake without credential rejected");
            return Err(AppError::Authentication("handshake carries no token".into()));
        };

        let user_id = self.tokens.verify(token).inspect_err(|err| {
            tracing::warn!(error = %err, "realtime handshake rejected");
        })?;

        let connection = self.channels.next_connection_id();
        tracing::debug!(%user_id, connection, "realtime connection authenticated");

        Ok(AuthenticatedConnection {
            gateway: self.clone(),
            user_id,
            connection,
        })
    }
}

pub struct AuthenticatedConnection {
    gateway: SessionGateway,
    user_id: UserId,
    connection: ConnectionId,
}

impl AuthenticatedConnection {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::Authenticated
    }

    pub fn bind(self, outbox: Outbox) -> BoundConnection {
        let own = self.gateway.channels.join(self.user_id, self.connection, outbox.clone());
        tracing::info!(user_id = %self.user_id, connection = self.connection, "realtime connection bound");

        BoundConnection {
            joined: HashSet::from([self.user_id]),
            memberships: vec![own],
            outbox,
            gateway: self.gateway,
            user_id: self.user_id,
            connection: self.connection,
        }
    }
}

pub struct BoundConnection {
    gateway: SessionGateway,
    user_id: UserId,
    connection: ConnectionId,
    outbox: Outbox,
    joined: HashSet<UserId>,
    memberships: Vec<Membership>,
}

impl BoundConnection {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::Bound
    }

    pub fn channels(&self) -> impl Iterator<Item = UserId> + '_ {
        self.memberships.iter().map(Membership::channel)
    }

    /// Malformed or unknown frames are dropped; they never close the connection.
    pub fn handle_frame(&mut self, frame: &str) {
        match serde_json::from_str::<ClientEvent>(frame) {
            Ok(event) => self.handle(event),
            Err(err) => {
                tracing::debug!(connection = self.connection, error = %err, "ignoring unreadable frame");
            }
        }
    }

    pub fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::OutgoingMessage(echo) => {
                if let Delivery::Pushed(n) = self.gateway.delivery.relay_echo(self.user_id, echo) {
                    tracing::debug!(sender = %self.user_id, connections = n, "relayed sender echo");
                }
            }
            ClientEvent::JoinChat(raw) => self.join_chat(&raw),
        }
    }

    fn join_chat(&mut self, raw: &str) {
        let Ok(channel) = Uuid::parse_str(raw.trim()) else {
            tracing::warn!(connection = self.connection, id = raw, "join_chat with unusable id ignored");
            return;
        };

        if self.gateway.join_policy == JoinPolicy::OwnChannelOnly && channel != self.user_id {
            tracing::warn!(connection = self.connection, %channel, "join_chat for a foreign channel refused");
            return;
        }

        if !self.joined.insert(channel) {
            return;
        }

        let seat = self.gateway.channels.join(channel, self.connection, self.outbox.clone());
        self.memberships.push(seat);
        tracing::debug!(connection = self.connection, %channel, "joined channel on request");
    }

    pub fn close(self) -> ConnectionState {
        tracing::info!(user_id = %self.user_id, connection = self.connection, "realtime connection closed");
        drop(self.memberships);
        ConnectionState::Closed
    }
}
