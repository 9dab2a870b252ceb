//! Accounts, passwords and bearer tokens
//!
//! Passwords are stored as `salt$digest`, where the digest is SHA-256 over
//! the salt and password, stretched for [`HASH_ROUNDS`] iterations. Tokens
//! are random base58 strings kept in the `sessions` table until they expire
//! or the user logs out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{LibraryError, LibraryResult};
use crate::models::{Role, User};
use crate::storage::{truncate_to_millis, users};
use crate::store::{required, Store};

const HASH_ROUNDS: u32 = 10_000;

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// An issued bearer token and the account it belongs to
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

impl Store {
    /// Create a regular user account
    pub fn register(&mut self, registration: Registration) -> LibraryResult<User> {
        self.create_account(registration, Role::User)
    }

    /// Create an administrator account
    pub fn create_admin(&mut self, registration: Registration) -> LibraryResult<User> {
        self.create_account(registration, Role::Admin)
    }

    fn create_account(&mut self, registration: Registration, role: Role) -> LibraryResult<User> {
        let name = required(&registration.name, "name")?;
        let email = required(&registration.email, "email")?.to_lowercase();
        if registration.password.is_empty() {
            return Err(LibraryError::validation("password is required"));
        }

        let user = User::new(name, email, role, hash_password(&registration.password));

        let tx = self.database_mut().write_transaction()?;
        if users::find_user_by_email(&tx, &user.email)?.is_some() {
            return Err(LibraryError::Conflict("Email already registered".to_string()));
        }
        users::insert_user(&tx, &user)?;
        tx.commit()?;

        info!(user_id = %user.id, role = %role, "Registered user");
        Ok(user)
    }

    /// Check credentials and issue a new token
    pub fn authenticate(
        &mut self,
        credentials: Credentials,
        now: DateTime<Utc>,
    ) -> LibraryResult<Session> {
        let now = truncate_to_millis(now);
        let email = required(&credentials.email, "email")?.to_lowercase();
        if credentials.password.is_empty() {
            return Err(LibraryError::validation("password is required"));
        }

        let user = users::find_user_by_email(self.connection(), &email)?
            .filter(|user| verify_password(&credentials.password, &user.password_hash))
            .ok_or_else(|| LibraryError::Unauthorized("Invalid email or password".to_string()))?;

        let expires_at = now
            .checked_add_signed(self.config().token_ttl())
            .ok_or_else(|| LibraryError::validation("token lifetime is out of range"))?;
        let token = generate_token();
        users::insert_session(self.connection(), &token, user.id, now, expires_at)?;

        let purged = users::purge_expired_sessions(self.connection(), now)?;
        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }

        info!(user_id = %user.id, "User logged in");
        Ok(Session {
            token,
            user,
            expires_at,
        })
    }

    /// Resolve a bearer token to its user
    pub fn verify_token(&self, token: &str, now: DateTime<Utc>) -> LibraryResult<User> {
        users::find_session_user(self.connection(), token, now)?
            .ok_or_else(|| LibraryError::Unauthorized("Invalid or expired token".to_string()))
    }

    /// Revoke a token; unknown tokens are ignored
    pub fn logout(&mut self, token: &str) -> LibraryResult<()> {
        if users::delete_session(self.connection(), token)? {
            debug!("Session revoked");
        }
        Ok(())
    }
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = digest(&salt, password);
    format!("{}${}", salt, digest)
}

/// Check a password against a stored `salt$digest` hash
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let actual = digest(salt, password);
    constant_time_eq(actual.as_bytes(), expected.as_bytes())
}

fn digest(salt: &str, password: &str) -> String {
    let mut hash = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..HASH_ROUNDS {
        hash = Sha256::new()
            .chain_update(hash)
            .chain_update(password.as_bytes())
            .finalize();
    }
    hex::encode(hash)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// 32 random bytes, base58 encoded
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    bs58::encode(bytes).into_string()
}
