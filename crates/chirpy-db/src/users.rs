use tracing::debug;

use crate::Database;
use crate::error::{DbError, Result};
use crate::models::User;

impl Database {
    /// Insert a new user keyed by `email`. `password_hash` must already be hashed.
    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let user = self.with_snapshot_mut(|snapshot, counters| {
            if snapshot.users.contains_key(email) {
                return Err(DbError::AlreadyExists(email.to_string()));
            }

            let user = User {
                id: counters.next_user_id(),
                email: email.to_string(),
                password: password_hash.to_string(),
                is_chirpy_red: false,
            };
            snapshot.users.insert(user.email.clone(), user.clone());
            Ok(user)
        })?;

        debug!("Created user {}", user.id);
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.with_snapshot(|snapshot| {
            snapshot
                .users
                .get(email)
                .cloned()
                .ok_or_else(|| DbError::UserNotFound(email.to_string()))
        })
    }

    /// Users are keyed by email, so this is a scan.
    pub fn find_user_by_id(&self, id: u64) -> Result<User> {
        self.with_snapshot(|snapshot| {
            snapshot
                .users
                .values()
                .find(|user| user.id == id)
                .cloned()
                .ok_or_else(|| DbError::UserNotFound(id.to_string()))
        })
    }

    /// Replace a user's email and password hash, rekeying the entry.
    ///
    /// Fails if another user already holds `email`. The upgraded flag is kept.
    pub fn update_credentials(&self, id: u64, email: &str, password_hash: &str) -> Result<User> {
        let user = self.with_snapshot_mut(|snapshot, _| {
            let old_email = snapshot
                .users
                .values()
                .find(|user| user.id == id)
                .map(|user| user.email.clone())
                .ok_or_else(|| DbError::UserNotFound(id.to_string()))?;

            if old_email != email && snapshot.users.contains_key(email) {
                return Err(DbError::AlreadyExists(email.to_string()));
            }

            let mut user = snapshot
                .users
                .remove(&old_email)
                .ok_or_else(|| DbError::UserNotFound(id.to_string()))?;
            user.email = email.to_string();
            user.password = password_hash.to_string();
            snapshot.users.insert(user.email.clone(), user.clone());
            Ok(user)
        })?;

        debug!("Updated credentials for user {}", user.id);
        Ok(user)
    }

    /// Set the upgraded flag on the user keyed by `email`.
    pub fn upgrade_user(&self, email: &str) -> Result<User> {
        let user = self.with_snapshot_mut(|snapshot, _| {
            let user = snapshot
                .users
                .get_mut(email)
                .ok_or_else(|| DbError::UserNotFound(email.to_string()))?;
            user.is_chirpy_red = true;
            Ok(user.clone())
        })?;

        debug!("Upgraded user {}", user.id);
        Ok(user)
    }

    /// Set the upgraded flag on the user with `id`. The lookup and the write
    /// share one critical section, so a concurrent email change cannot make
    /// the user vanish in between.
    pub fn upgrade_user_by_id(&self, id: u64) -> Result<User> {
        let user = self.with_snapshot_mut(|snapshot, _| {
            let user = snapshot
                .users
                .values_mut()
                .find(|user| user.id == id)
                .ok_or_else(|| DbError::UserNotFound(id.to_string()))?;
            user.is_chirpy_red = true;
            Ok(user.clone())
        })?;

        debug!("Upgraded user {}", user.id);
        Ok(user)
    }
}
