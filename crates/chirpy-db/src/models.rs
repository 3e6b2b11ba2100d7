//! Persisted record types. These map directly onto the JSON database file and
//! are distinct from the chirpy-types API bodies.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Everything the database file holds, read and written as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub chirps: BTreeMap<u64, Chirp>,
    /// Keyed by email.
    #[serde(default, alias = "Users", deserialize_with = "null_as_empty")]
    pub users: BTreeMap<String, User>,
    /// Keyed by the refresh token string.
    #[serde(default, alias = "Tokens", deserialize_with = "null_as_empty")]
    pub tokens: BTreeMap<String, RefreshToken>,
}

impl Snapshot {
    /// Decode file contents. A zero-length (or blank) file is an empty database.
    pub fn decode(data: &[u8]) -> serde_json::Result<Self> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(data)
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn max_chirp_id(&self) -> u64 {
        self.chirps.keys().next_back().copied().unwrap_or(0)
    }

    pub fn max_user_id(&self) -> u64 {
        self.users.values().map(|u| u.id).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: u64,
    pub body: String,
    /// Absent on chirps written before authorship was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    /// Argon2 PHC string, never plaintext.
    pub password: String,
    #[serde(default)]
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token: String,
    #[serde(rename = "id")]
    pub user_id: u64,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn empty_file_is_empty_snapshot() {
        assert_eq!(Snapshot::decode(b"").unwrap(), Snapshot::default());
        assert_eq!(Snapshot::decode(b" \n").unwrap(), Snapshot::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Snapshot::decode(b"{\"chirps\": [").is_err());
    }

    #[test]
    fn file_layout() {
        let mut snapshot = Snapshot::default();
        snapshot.chirps.insert(
            7,
            Chirp { id: 7, body: "hi".into(), author_id: Some(1) },
        );
        let json: serde_json::Value =
            serde_json::from_slice(&snapshot.encode().unwrap()).unwrap();
        assert_eq!(json["chirps"]["7"]["body"], "hi");
        assert_eq!(json["chirps"]["7"]["author_id"], 1);
        assert!(json["users"].as_object().unwrap().is_empty());
        assert!(json["tokens"].as_object().unwrap().is_empty());
    }

    #[test]
    fn reads_legacy_layout() {
        let data = br#"{
            "chirps": {"1": {"id": 1, "body": "old"}},
            "Users": {"a@b.c": {"id": 1, "email": "a@b.c", "password": "x"}},
            "Tokens": null
        }"#;
        let snapshot = Snapshot::decode(data).unwrap();
        assert_eq!(snapshot.chirps[&1].author_id, None);
        assert!(!snapshot.users["a@b.c"].is_chirpy_red);
        assert!(snapshot.tokens.is_empty());
        assert_eq!(snapshot.max_chirp_id(), 1);
        assert_eq!(snapshot.max_user_id(), 1);
    }

    #[test]
    fn token_expiry() {
        let now = Utc::now();
        let token = RefreshToken {
            token: "abc".into(),
            user_id: 1,
            expires_at: now + Duration::days(60),
        };
        assert!(!token.is_expired_at(now));
        assert!(token.is_expired_at(now + Duration::days(61)));
    }
}
