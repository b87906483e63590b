//! Property tests for the chat log.
//!
//! Whatever the arrival order, each user has at most one visible status
//! notice, it shows the latest status, and non-status items are never lost.

use std::collections::HashMap;

use parley_app::{ChatItem, ChatLog, Message, StatusLine};
use proptest::prelude::*;

fn username() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["alice", "bob", "carol"]).prop_map(str::to_string)
}

fn item() -> impl Strategy<Value = ChatItem> {
    prop_oneof![
        (username(), "[a-z ]{0,12}").prop_map(|(username, text)| {
            ChatItem::Message(Message { username, text, timestamp: None })
        }),
        (username(), prop::sample::select(vec!["online", "offline", "away"])).prop_map(
            |(username, status)| {
                ChatItem::Status(StatusLine { username, status: status.into(), timestamp: None })
            }
        ),
    ]
}

proptest! {
    #[test]
    fn one_notice_per_user(items in prop::collection::vec(item(), 0..60)) {
        let mut log = ChatLog::new();
        let mut latest: HashMap<String, String> = HashMap::new();
        let mut messages = 0;

        for item in items {
            match &item {
                ChatItem::Status(s) => {
                    latest.insert(s.username.clone(), s.status.clone());
                },
                _ => messages += 1,
            }
            log.push(item);
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for item in log.items() {
            if let ChatItem::Status(s) = item {
                *seen.entry(s.username.as_str()).or_default() += 1;
            }
        }
        prop_assert!(seen.values().all(|&n| n == 1), "duplicate notices: {:?}", seen);
        prop_assert_eq!(seen.len(), latest.len());

        for (user, status) in &latest {
            prop_assert_eq!(log.status_of(user).map(|s| s.status.as_str()), Some(status.as_str()));
        }

        let kept = log.items().iter().filter(|i| !matches!(i, ChatItem::Status(_))).count();
        prop_assert_eq!(kept, messages);
    }

    #[test]
    fn latest_notice_is_after_everything_it_replaced(items in prop::collection::vec(item(), 1..40)) {
        let mut log = ChatLog::new();
        for item in items {
            let is_status = matches!(item, ChatItem::Status(_));
            log.push(item);
            if is_status {
                prop_assert!(matches!(log.items().last(), Some(ChatItem::Status(_))));
            }
        }
    }
}
