use chrono::{DateTime, Utc};
use tracing::debug;

use crate::Database;
use crate::error::{DbError, Result};
use crate::models::RefreshToken;

impl Database {
    /// Insert (or overwrite) a refresh token record.
    pub fn store_refresh_token(
        &self,
        token: &str,
        user_id: u64,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken> {
        let record = RefreshToken {
            token: token.to_string(),
            user_id,
            expires_at,
        };
        let stored = record.clone();
        self.with_snapshot_mut(move |snapshot, _| {
            snapshot.tokens.insert(record.token.clone(), record);
            Ok(())
        })?;

        debug!("Stored refresh token for user {}", user_id);
        Ok(stored)
    }

    /// Fetch a refresh token record. Expiry is not checked here.
    pub fn lookup_refresh_token(&self, token: &str) -> Result<RefreshToken> {
        self.with_snapshot(|snapshot| {
            snapshot
                .tokens
                .get(token)
                .cloned()
                .ok_or(DbError::TokenNotFound)
        })
    }

    /// Remove a refresh token. Returns whether it existed.
    pub fn delete_refresh_token(&self, token: &str) -> Result<bool> {
        let removed = self.with_snapshot_mut_if_changed(|snapshot, _| {
            let removed = snapshot.tokens.remove(token).is_some();
            Ok((removed, removed))
        })?;

        if removed {
            debug!("Deleted refresh token");
        }
        Ok(removed)
    }

    /// Drop every token that expired before `now`. Returns how many went.
    pub fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_snapshot_mut_if_changed(|snapshot, _| {
            let before = snapshot.tokens.len();
            snapshot.tokens.retain(|_, token| !token.is_expired_at(now));
            let purged = before - snapshot.tokens.len();
            Ok((purged, purged > 0))
        })
    }
}
