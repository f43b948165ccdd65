//! Proptest generators for property-based testing.

use proptest::prelude::*;

use crusia_core::{SaveKey, UserId, KEY_LEN};

/// Generate a random save key.
pub fn save_key() -> impl Strategy<Value = SaveKey> {
    any::<[u8; KEY_LEN]>().prop_map(SaveKey::from_bytes)
}

/// Generate a protocol version.
pub fn version() -> impl Strategy<Value = u32> {
    any::<u32>()
}

/// Generate a set of distinct protocol versions, at least one.
pub fn versions(max: usize) -> impl Strategy<Value = Vec<u32>> {
    prop::collection::btree_set(0u32..64, 1..=max.max(1))
        .prop_map(|set| set.into_iter().collect())
}

/// Generate a user id.
pub fn user_id() -> impl Strategy<Value = UserId> {
    any::<i64>().prop_map(UserId::new)
}

/// Generate plaintext bytes of at most `max_len`.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a save payload the way a client would: a small JSON object.
pub fn save_json() -> impl Strategy<Value = String> {
    prop::collection::btree_map("[a-z]{1,8}", any::<i32>(), 0..6).prop_map(|fields| {
        serde_json::to_string(&fields).unwrap_or_else(|_| "{}".to_string())
    })
}

/// Generate a username.
pub fn username() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_map(String::from)
}

/// Generate a passhash as clients send it (hex digest).
pub fn passhash() -> impl Strategy<Value = String> {
    "[0-9a-f]{64}".prop_map(String::from)
}

/// Generate a string shaped like a token but never issued.
pub fn junk_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9a-f]{64}".prop_map(String::from),
        "[A-Za-z0-9_-]{1,40}\\.[A-Za-z0-9_-]{1,90}".prop_map(String::from),
        "[ -~]{0,80}".prop_map(String::from),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn versions_are_distinct(vs in versions(8)) {
            let mut sorted = vs.clone();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), vs.len());
            prop_assert!(!vs.is_empty());
        }

        #[test]
        fn save_json_is_an_object(json in save_json()) {
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            prop_assert!(value.is_object());
        }
    }
}
