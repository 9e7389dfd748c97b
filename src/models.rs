use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub type UserId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Volunteer,
    Ngo,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        use Role::*;
        match self {
            Volunteer => "volunteer",
            Ngo => "ngo",
            Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volunteer" => Ok(Role::Volunteer),
            "ngo" => Ok(Role::Ngo),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpportunityStatus {
    Open,
    Closed,
    InProgress,
}

impl OpportunityStatus {
    pub fn as_str(&self) -> &'static str {
        use OpportunityStatus::*;
        match self {
            Open => "open",
            Closed => "closed",
            InProgress => "in-progress",
        }
    }
}

impl fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpportunityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(OpportunityStatus::Open),
            "closed" => Ok(OpportunityStatus::Closed),
            "in-progress" => Ok(OpportunityStatus::InProgress),
            other => Err(format!("unknown opportunity status {other}")),
        }
    }
}

/// Read-only view of a user from the identity directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerProfile {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub owner_id: UserId,
    pub status: OpportunityStatus,
}

/// A persisted message. Never mutated after the store hands it back.
///
/// Fields go over the wire in snake_case, the same shape `POST /messages` and
/// the `outgoingMessage` frame accept, so a client can send back what it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl Message {
    /// The party on the other side of this message from `user`, if `user` took part at all.
    pub fn counterpart_of(&self, user: UserId) -> Option<UserId> {
        if self.sender_id == user {
            Some(self.receiver_id)
        } else if self.receiver_id == user {
            Some(self.sender_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
}

impl NewMessage {
    pub fn into_message(self, timestamp: i64) -> Message {
        Message {
            id: Uuid::now_v7(),
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            timestamp,
        }
    }
}

/// One row of `GET /messages/conversations`. This summary is camelCase on the
/// wire, unlike [`Message`]; existing inbox clients read these exact keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub other_user_id: UserId,
    pub other_user_name: String,
    pub last_message: LastMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastMessage {
    pub text: String,
    pub timestamp: i64,
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counterpart_is_the_other_party() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let msg = NewMessage { sender_id: a, receiver_id: b, content: "hi".into() }.into_message(1);

        assert_eq!(msg.counterpart_of(a), Some(b));
        assert_eq!(msg.counterpart_of(b), Some(a));
        assert_eq!(msg.counterpart_of(c), None);
    }

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&OpportunityStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!("in-progress".parse::<OpportunityStatus>(), Ok(OpportunityStatus::InProgress));
        assert!("pending".parse::<OpportunityStatus>().is_err());
    }

    #[test]
    fn messages_and_conversations_keep_their_wire_keys() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let msg = NewMessage { sender_id: a, receiver_id: b, content: "hi".into() }.into_message(7);

        let json = serde_json::to_value(&msg).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["content", "id", "receiver_id", "sender_id", "timestamp"]);

        let summary = Conversation {
            other_user_id: b,
            other_user_name: "Bina".into(),
            last_message: LastMessage { text: msg.content, timestamp: msg.timestamp },
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({
                "otherUserId": b,
                "otherUserName": "Bina",
                "lastMessage": { "text": "hi", "timestamp": 7 },
            })
        );
    }

    #[test]
    fn missing_skills_deserialize_as_empty() {
        let profile: VolunteerProfile = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "name": "Asha",
        }))
        .unwrap();
        assert!(profile.skills.is_empty());
        assert_eq!(profile.location, None);
    }
}
