use std::collections::HashMap;

use crate::{
    directory::IdentityDirectory,
    models::{Conversation, LastMessage, Message, UserId},
    AppResult,
};

pub const UNKNOWN_USER_NAME: &str = "Unknown user";

/// Latest message per counterpart, most recent thread first.
///
/// Messages `requester` took no part in are skipped. When two messages with the
/// same counterpart share a timestamp, the later one in log order wins.
pub fn latest_per_counterpart(requester: UserId, messages: &[Message]) -> Vec<(UserId, &Message)> {
    let mut latest: HashMap<UserId, &Message> = HashMap::new();
    let mut first_seen: Vec<UserId> = Vec::new();

    for message in messages {
        let Some(counterpart) = message.counterpart_of(requester) else {
            tracing::warn!(message_id = %message.id, "message does not involve requester, skipping");
            continue;
        };

        if !latest.contains_key(&counterpart) {
            first_seen.push(counterpart);
        }
        if latest
            .get(&counterpart)
            .is_none_or(|current| message.timestamp >= current.timestamp)
        {
            latest.insert(counterpart, message);
        }
    }

    let mut threads: Vec<(UserId, &Message)> = first_seen
        .into_iter()
        .filter_map(|counterpart| latest.get(&counterpart).map(|message| (counterpart, *message)))
        .collect();
    threads.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
    threads
}

pub async fn aggregate(
    identities: &dyn IdentityDirectory,
    requester: UserId,
    messages: &[Message],
) -> AppResult<Vec<Conversation>> {
    let mut conversations = Vec::new();

    for (counterpart, message) in latest_per_counterpart(requester, messages) {
        let name = match identities.display_name(counterpart).await {
            Ok(Some(name)) => name,
            Ok(None) => UNKNOWN_USER_NAME.to_owned(),
            Err(err) => {
                tracing::warn!(%counterpart, error = %err, "could not resolve counterpart name");
                UNKNOWN_USER_NAME.to_owned()
            }
        };

        conversations.push(Conversation {
            other_user_id: counterpart,
            other_user_name: name,
            last_message: LastMessage {
                text: message.content.clone(),
                timestamp: message.timestamp,
            },
        });
    }

    Ok(conversations)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::{models::{NewMessage, VolunteerProfile}, AppError};

    fn msg(sender_id: UserId, receiver_id: UserId, timestamp: i64) -> Message {
        NewMessage { sender_id, receiver_id, content: format!("t={timestamp}") }.into_message(timestamp)
    }

    struct Names(HashMap<UserId, String>);

    #[async_trait]
    impl IdentityDirectory for Names {
        async fn profile(&self, _id: UserId) -> AppResult<Option<VolunteerProfile>> {
            Ok(None)
        }

        async fn volunteers(&self) -> AppResult<Vec<VolunteerProfile>> {
            Ok(vec![])
        }

        async fn display_name(&self, id: UserId) -> AppResult<Option<String>> {
            if id.is_nil() {
                return Err(AppError::Store(sqlx::Error::PoolTimedOut));
            }
            Ok(self.0.get(&id).cloned())
        }
    }

    #[test]
    fn one_thread_per_counterpart_newest_first() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let messages = vec![msg(a, b, 1), msg(b, a, 3), msg(a, c, 2)];

        let threads = latest_per_counterpart(a, &messages);
        let summary: Vec<_> = threads.iter().map(|(who, m)| (*who, m.timestamp)).collect();
        assert_eq!(summary, vec![(b, 3), (c, 2)]);
    }

    #[test]
    fn last_message_is_the_maximum_regardless_of_log_order() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let messages = vec![msg(b, a, 9), msg(a, b, 4), msg(a, b, 7)];

        let threads = latest_per_counterpart(a, &messages);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].1.timestamp, 9);
    }

    #[test]
    fn count_matches_distinct_counterparts() {
        let a = Uuid::now_v7();
        let others: Vec<_> = (0..4).map(|_| Uuid::now_v7()).collect();
        let messages: Vec<_> = (0..12)
            .map(|i| {
                let other = others[i % others.len()];
                if i % 2 == 0 { msg(a, other, i as i64) } else { msg(other, a, i as i64) }
            })
            .collect();

        let threads = latest_per_counterpart(a, &messages);
        let distinct: HashSet<_> = messages.iter().filter_map(|m| m.counterpart_of(a)).collect();
        assert_eq!(threads.len(), distinct.len());
        for (counterpart, last) in threads {
            let max = messages
                .iter()
                .filter(|m| m.counterpart_of(a) == Some(counterpart))
                .map(|m| m.timestamp)
                .max();
            assert_eq!(Some(last.timestamp), max);
        }
    }

    #[test]
    fn foreign_messages_are_skipped() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let messages = vec![msg(b, c, 10), msg(a, b, 1)];

        let threads = latest_per_counterpart(a, &messages);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].1.timestamp, 1);
    }

    #[tokio::test]
    async fn unresolvable_names_fall_back_to_placeholder() {
        let (a, b, ghost) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let names = Names(HashMap::from([(b, "Bina".to_owned())]));
        let messages = vec![msg(a, b, 1), msg(ghost, a, 2), msg(a, Uuid::nil(), 3)];

        let conversations = aggregate(&names, a, &messages).await.unwrap();
        let labels: Vec<_> = conversations.iter().map(|c| c.other_user_name.as_str()).collect();
        assert_eq!(labels, vec![UNKNOWN_USER_NAME, UNKNOWN_USER_NAME, "Bina"]);
        assert_eq!(conversations[2].last_message.text, "t=1");
    }
}
