//! Item and user identity.
//!
//! Items are content-addressed: two items with the same question and answer
//! share one key. Users are identified by a short token derived from request
//! metadata, which is good enough to remember a vote but is not an
//! authentication mechanism.

use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Maximum accepted length of an item key, in bytes.
pub const MAX_ITEM_KEY_LEN: usize = 512;

/// Length of a derived user id, in characters.
pub const USER_ID_LEN: usize = 32;

/// Placeholder for request metadata that was not supplied.
const UNKNOWN: &str = "unknown";

/// The visible content of an item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemIdentity {
    pub question: String,
    pub answer: String,
}

impl ItemIdentity {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Derive the stable key for this item.
    ///
    /// Each field is hashed behind its byte length, so no choice of
    /// characters inside the question can shift bytes into the answer.
    pub fn key(&self) -> ItemKey {
        let mut hasher = Sha256::new();
        for field in [&self.question, &self.answer] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        let digest = hasher.finalize();
        ItemKey(digest.iter().map(|b| format!("{b:02x}")).collect())
    }
}

/// Key identifying an item in the rating store.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey(String);

impl ItemKey {
    /// Parse a key supplied by a client.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidItemKey(
                "item key must not be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_ITEM_KEY_LEN {
            return Err(crate::Error::InvalidItemKey(format!(
                "item key is {} bytes, maximum is {MAX_ITEM_KEY_LEN}",
                trimmed.len()
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemKey {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(&value)
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey({})", self.0)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pseudo-anonymous user identity.
///
/// Two clients behind the same address with the same agent string collapse
/// into one user, and long agent strings are cut off by the truncation.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Derive a user id from the origin address and client signature.
    pub fn derive(address: Option<&str>, agent: Option<&str>) -> Self {
        let address = non_blank(address).unwrap_or(UNKNOWN);
        let agent = non_blank(agent).unwrap_or(UNKNOWN);
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{address}:{agent}"));
        Self(encoded.chars().take(USER_ID_LEN).collect())
    }

    /// Wrap an id that was previously derived and persisted.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_key_is_deterministic() {
        let a = ItemIdentity::new("Why did the chicken cross the road?", "To get to the other side.");
        let b = ItemIdentity::new("Why did the chicken cross the road?", "To get to the other side.");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().as_str().len(), 64);
    }

    #[test]
    fn item_key_separator_in_content_does_not_collide() {
        // A naive "question|answer" concatenation maps both of these to "a|b|c".
        let left = ItemIdentity::new("a|b", "c");
        let right = ItemIdentity::new("a", "b|c");
        assert_ne!(left.key(), right.key());
    }

    #[test]
    fn item_key_differs_when_answer_differs() {
        let a = ItemIdentity::new("q", "one");
        let b = ItemIdentity::new("q", "two");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn item_key_parse_trims_and_rejects_empty() {
        assert_eq!(ItemKey::parse("  abc ").unwrap().as_str(), "abc");
        assert!(matches!(
            ItemKey::parse("   "),
            Err(crate::Error::InvalidItemKey(_))
        ));
        assert!(ItemKey::parse("").is_err());
    }

    #[test]
    fn item_key_parse_rejects_oversized() {
        let long = "k".repeat(MAX_ITEM_KEY_LEN + 1);
        assert!(ItemKey::parse(&long).is_err());
        let max = "k".repeat(MAX_ITEM_KEY_LEN);
        assert!(ItemKey::parse(&max).is_ok());
    }

    #[test]
    fn item_key_deserialize_validates() {
        let ok: ItemKey = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(ok.as_str(), "abc");
        assert!(serde_json::from_str::<ItemKey>("\"\"").is_err());
    }

    #[test]
    fn user_id_matches_encoded_metadata() {
        let id = UserId::derive(Some("1.2.3.4"), Some("curl/8"));
        // base64("1.2.3.4:curl/8")
        assert_eq!(id.as_str(), "MS4yLjMuNDpjdXJsLzg=");
    }

    #[test]
    fn user_id_is_truncated() {
        let id = UserId::derive(Some("203.0.113.10"), Some(&"Mozilla/5.0 ".repeat(10)));
        assert_eq!(id.as_str().len(), USER_ID_LEN);
    }

    #[test]
    fn user_id_falls_back_to_unknown() {
        let missing = UserId::derive(None, None);
        let blank = UserId::derive(Some(" "), Some(""));
        let explicit = UserId::derive(Some("unknown"), Some("unknown"));
        assert_eq!(missing, explicit);
        assert_eq!(blank, explicit);
    }

    #[test]
    fn user_id_distinguishes_agents() {
        let a = UserId::derive(Some("10.0.0.1"), Some("alice"));
        let b = UserId::derive(Some("10.0.0.1"), Some("bob"));
        assert_ne!(a, b);
    }
}
