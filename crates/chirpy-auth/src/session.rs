use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use chirpy_db::{Database, DbError, RefreshToken, User};

use crate::error::{AuthError, Result};
use crate::password::{hash_password, verify_password};
use crate::tokens::{MAX_ACCESS_TOKEN_TTL_SECS, TokenSigner, generate_refresh_token};

/// Refresh tokens stay valid for 60 days after login.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 60;

/// What a successful login hands back.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Accounts and the login, refresh, revoke lifecycle.
///
/// Built once at start-up and shared behind the application state.
pub struct SessionService {
    db: Arc<Database>,
    signer: TokenSigner,
}

impl SessionService {
    pub fn new(db: Arc<Database>, jwt_secret: &str) -> Self {
        Self {
            db,
            signer: TokenSigner::new(jwt_secret),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn signup(&self, email: &str, password: &str) -> Result<User> {
        require_credentials(email, password)?;
        let password_hash = hash_password(password)?;
        Ok(self.db.create_user(email, &password_hash)?)
    }

    /// Check the password, then issue an access token (lifetime clamped to an
    /// hour) and a fresh persisted refresh token.
    pub fn login(&self, email: &str, password: &str, expires_in_secs: u64) -> Result<Session> {
        require_credentials(email, password)?;

        let user = self.db.get_user_by_email(email)?;
        if let Err(e) = verify_password(password, &user.password) {
            warn!("Failed login for user {}", user.id);
            return Err(e);
        }

        let access_token = self.signer.issue_access_token(user.id, expires_in_secs)?;
        let refresh = self.issue_refresh_token(user.id)?;

        debug!("User {} logged in", user.id);
        Ok(Session {
            user,
            access_token,
            refresh_token: refresh.token,
        })
    }

    /// Resolve a bearer access token to a user id.
    pub fn authenticate(&self, access_token: &str) -> Result<u64> {
        self.signer.verify_access_token(access_token)
    }

    /// Generate and persist a refresh token for `user_id`.
    pub fn issue_refresh_token(&self, user_id: u64) -> Result<RefreshToken> {
        let token = generate_refresh_token();
        let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS);
        Ok(self.db.store_refresh_token(&token, user_id, expires_at)?)
    }

    /// Stored record for a refresh token. Expiry is left to the caller.
    pub fn lookup_refresh_token(&self, token: &str) -> Result<RefreshToken> {
        Ok(self.db.lookup_refresh_token(token)?)
    }

    /// Exchange a live refresh token for a new one-hour access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String> {
        let record = self.lookup_refresh_token(refresh_token).map_err(|e| match e {
            AuthError::Db(DbError::TokenNotFound) => AuthError::UnknownRefreshToken,
            other => other,
        })?;

        if record.is_expired() {
            warn!("Expired refresh token presented for user {}", record.user_id);
            return Err(AuthError::RefreshExpired);
        }

        self.signer
            .issue_access_token(record.user_id, MAX_ACCESS_TOKEN_TTL_SECS)
    }

    /// Forget a refresh token. Unknown tokens are not an error.
    pub fn revoke(&self, refresh_token: &str) -> Result<()> {
        self.db.delete_refresh_token(refresh_token)?;
        Ok(())
    }

    /// Replace email and password for `user_id`, hashing the new password first.
    pub fn update_credentials(&self, user_id: u64, email: &str, password: &str) -> Result<User> {
        require_credentials(email, password)?;
        let password_hash = hash_password(password)?;
        Ok(self.db.update_credentials(user_id, email, &password_hash)?)
    }
}

fn require_credentials(email: &str, password: &str) -> Result<()> {
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirpy_types::error::ErrorKind;
    use tempfile::TempDir;

    fn service() -> (TempDir, SessionService) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("database.json")).unwrap();
        (dir, SessionService::new(Arc::new(db), "test-secret"))
    }

    #[test]
    fn signup_stores_a_hash() {
        let (_dir, svc) = service();
        let user = svc.signup("walt@breakingbad.com", "123456").unwrap();

        let stored = svc.db().get_user_by_email("walt@breakingbad.com").unwrap();
        assert_eq!(stored.id, user.id);
        assert_ne!(stored.password, "123456");
        verify_password("123456", &stored.password).unwrap();
    }

    #[test]
    fn signup_requires_credentials() {
        let (_dir, svc) = service();
        assert_eq!(svc.signup("", "pw").unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(svc.signup("a@b.c", "").unwrap_err().kind(), ErrorKind::Validation);
        assert!(svc.db().load().unwrap().users.is_empty());
    }

    #[test]
    fn duplicate_signup_conflicts() {
        let (_dir, svc) = service();
        svc.signup("walt@breakingbad.com", "123456").unwrap();
        let err = svc.signup("walt@breakingbad.com", "654321").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn login_refresh_revoke_lifecycle() {
        let (_dir, svc) = service();
        let user = svc.signup("saul@bettercall.com", "lawyer").unwrap();

        let session = svc.login("saul@bettercall.com", "lawyer", 0).unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(svc.authenticate(&session.access_token).unwrap(), user.id);

        let record = svc.lookup_refresh_token(&session.refresh_token).unwrap();
        assert_eq!(record.user_id, user.id);
        let days = (record.expires_at - Utc::now()).num_days();
        assert!((59..=60).contains(&days));

        let fresh = svc.refresh(&session.refresh_token).unwrap();
        assert_eq!(svc.authenticate(&fresh).unwrap(), user.id);

        svc.revoke(&session.refresh_token).unwrap();
        assert!(matches!(
            svc.refresh(&session.refresh_token),
            Err(AuthError::UnknownRefreshToken)
        ));
        // Revoking twice is fine.
        svc.revoke(&session.refresh_token).unwrap();
    }

    #[test]
    fn each_login_gets_its_own_refresh_token() {
        let (_dir, svc) = service();
        svc.signup("a@example.com", "pw").unwrap();
        let first = svc.login("a@example.com", "pw", 0).unwrap();
        let second = svc.login("a@example.com", "pw", 0).unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert!(svc.refresh(&first.refresh_token).is_ok());
        assert!(svc.refresh(&second.refresh_token).is_ok());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let (_dir, svc) = service();
        svc.signup("a@example.com", "right").unwrap();
        assert!(matches!(
            svc.login("a@example.com", "wrong", 0),
            Err(AuthError::Mismatch)
        ));
        assert!(svc.db().load().unwrap().tokens.is_empty());
    }

    #[test]
    fn unknown_email_is_not_found() {
        let (_dir, svc) = service();
        let err = svc.login("ghost@example.com", "pw", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn expired_refresh_token_is_rejected() {
        let (_dir, svc) = service();
        svc.db()
            .store_refresh_token("old", 1, Utc::now() - Duration::days(1))
            .unwrap();

        assert!(svc.lookup_refresh_token("old").unwrap().is_expired());
        assert!(matches!(svc.refresh("old"), Err(AuthError::RefreshExpired)));
    }

    #[test]
    fn update_credentials_rehashes() {
        let (_dir, svc) = service();
        let user = svc.signup("old@example.com", "old-pw").unwrap();

        let updated = svc
            .update_credentials(user.id, "new@example.com", "new-pw")
            .unwrap();
        assert_eq!(updated.email, "new@example.com");

        assert!(svc.login("new@example.com", "new-pw", 0).is_ok());
        assert!(matches!(
            svc.login("new@example.com", "old-pw", 0),
            Err(AuthError::Mismatch)
        ));
        assert_eq!(
            svc.login("old@example.com", "old-pw", 0).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
