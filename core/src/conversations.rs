/// Conversation aggregation: folds a shop's flat message history into
/// per-customer summaries for the admin's thread list
use crate::messaging_types::{parse_created_at, ConversationSummary, Message, Role};
use std::collections::HashMap;

/// Build one summary per customer that appears as sender or receiver.
///
/// The latest message per customer wins (strictly greater timestamp; a tie
/// keeps the earlier entry) and sets the unread flag when it came from the
/// customer. Output is ordered newest thread first; missing timestamps parse
/// as the epoch and sink to the bottom. Messages with no customer on either
/// end cannot be attributed to a thread and are skipped.
pub fn aggregate_shop_messages(messages: &[Message], shop_id: &str) -> Vec<ConversationSummary> {
    let mut latest: HashMap<&str, &Message> = HashMap::new();

    for message in messages {
        let customer_id = if message.sender_type == Role::Customer {
            message.sender_id.as_str()
        } else if message.receiver_type == Role::Customer {
            message.receiver_id.as_str()
        } else {
            continue;
        };

        let newer = match latest.get(customer_id) {
            Some(current) => message.created_at_time() > current.created_at_time(),
            None => true,
        };
        if newer {
            latest.insert(customer_id, message);
        }
    }

    let mut summaries: Vec<ConversationSummary> = latest
        .into_iter()
        .map(|(customer_id, message)| ConversationSummary {
            customer_id: customer_id.to_string(),
            customer_name: format!("Customer {}", customer_id),
            shop_id: shop_id.to_string(),
            last_message: message.message_text.clone(),
            last_message_time: message.created_at.clone(),
            unread: message.sender_type == Role::Customer,
        })
        .collect();

    summaries.sort_by_key(|summary| {
        std::cmp::Reverse(parse_created_at(summary.last_message_time.as_deref()))
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(
        sender_type: Role,
        sender_id: &str,
        receiver_type: Role,
        receiver_id: &str,
        text: &str,
        created_at: Option<&str>,
    ) -> Message {
        Message {
            id: None,
            sender_type,
            sender_id: sender_id.to_string(),
            receiver_type,
            receiver_id: receiver_id.to_string(),
            shop_id: "1".to_string(),
            message_text: text.to_string(),
            created_at: created_at.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_shop_messages(&[], "1").is_empty());
    }

    #[test]
    fn test_answered_thread_is_read() {
        // Scenario: customer writes, admin replies — the reply is the
        // latest message, so the thread is not unread
        let messages = vec![
            msg(Role::Customer, "7", Role::Admin, "3", "hi", Some("2026-08-01T10:00:00Z")),
            msg(Role::Admin, "3", Role::Customer, "7", "hello", Some("2026-08-01T10:00:05Z")),
        ];

        let summaries = aggregate_shop_messages(&messages, "1");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].customer_id, "7");
        assert_eq!(summaries[0].last_message, "hello");
        assert_eq!(
            summaries[0].last_message_time.as_deref(),
            Some("2026-08-01T10:00:05Z")
        );
        assert!(!summaries[0].unread);
    }

    #[test]
    fn test_unanswered_thread_is_unread() {
        let messages = vec![msg(
            Role::Customer,
            "7",
            Role::Admin,
            "3",
            "hi",
            Some("2026-08-01T10:00:00Z"),
        )];

        let summaries = aggregate_shop_messages(&messages, "1");
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].unread);
        assert_eq!(summaries[0].last_message, "hi");
    }

    #[test]
    fn test_threads_sorted_newest_first() {
        let messages = vec![
            msg(Role::Customer, "7", Role::Admin, "3", "early", Some("2026-08-01T09:00:00Z")),
            msg(Role::Customer, "9", Role::Admin, "3", "late", Some("2026-08-01T11:00:00Z")),
            msg(Role::Admin, "3", Role::Customer, "7", "reply", Some("2026-08-01T10:00:00Z")),
        ];

        let summaries = aggregate_shop_messages(&messages, "1");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].customer_id, "9");
        assert_eq!(summaries[1].customer_id, "7");
        assert_eq!(summaries[1].last_message, "reply");
    }

    #[test]
    fn test_idempotent() {
        let messages = vec![
            msg(Role::Customer, "7", Role::Admin, "3", "hi", Some("2026-08-01T10:00:00Z")),
            msg(Role::Customer, "9", Role::Admin, "3", "yo", Some("2026-08-01T11:00:00Z")),
        ];

        let first = aggregate_shop_messages(&messages, "1");
        let second = aggregate_shop_messages(&messages, "1");
        assert_eq!(first, second);
    }

    #[test]
    fn test_messages_without_customer_are_skipped() {
        let messages = vec![msg(
            Role::Admin,
            "3",
            Role::Admin,
            "4",
            "internal note",
            Some("2026-08-01T10:00:00Z"),
        )];

        assert!(aggregate_shop_messages(&messages, "1").is_empty());
    }

    #[test]
    fn test_missing_timestamp_sorts_earliest() {
        let messages = vec![
            msg(Role::Customer, "7", Role::Admin, "3", "no clock", None),
            msg(Role::Customer, "9", Role::Admin, "3", "stamped", Some("2026-08-01T10:00:00Z")),
        ];

        let summaries = aggregate_shop_messages(&messages, "1");
        assert_eq!(summaries[0].customer_id, "9");
        assert_eq!(summaries[1].customer_id, "7");
        assert_eq!(summaries[1].last_message_time, None);
    }

    #[test]
    fn test_equal_timestamps_keep_first_seen() {
        let messages = vec![
            msg(Role::Customer, "7", Role::Admin, "3", "first", Some("2026-08-01T10:00:00Z")),
            msg(Role::Customer, "7", Role::Admin, "3", "second", Some("2026-08-01T10:00:00Z")),
        ];

        let summaries = aggregate_shop_messages(&messages, "1");
        assert_eq!(summaries[0].last_message, "first");
    }
}
