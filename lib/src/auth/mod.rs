//! Operator credentials and sessions.
//!
//! Passwords are stored as argon2 PHC strings and never leave this module.
//! Sessions are handled in [`session`].

pub mod session;

use std::sync::OnceLock;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::db::Database;
use crate::error::{ErrorKind, Result};

pub use session::{open_claims, revocation_cookie, Sessions, SESSION_COOKIE};

/// Collection holding operator accounts, keyed by username.
pub const CREDENTIALS: &str = "admin_users";

/// One operator account.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
}

/// Storage of operator accounts.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored password hash, `None` if the username is unknown.
    fn lookup_credential_hash(&self, username: &str) -> Result<Option<String>>;

    /// Stores the hash unless an account with this username already exists.
    /// Returns whether anything was written.
    fn upsert_credential_if_absent(&self, username: &str, password_hash: &str) -> Result<bool>;
}

impl CredentialStore for Database {
    fn lookup_credential_hash(&self, username: &str) -> Result<Option<String>> {
        Ok(self
            .get_raw_at::<Credential>(CREDENTIALS, username)?
            .map(|c| c.password_hash))
    }

    fn upsert_credential_if_absent(&self, username: &str, password_hash: &str) -> Result<bool> {
        let credential = Credential {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        self.insert_if_absent(CREDENTIALS, username, &credential)
    }
}

/// Hashes the password with argon2id using the library defaults
/// (19 MiB, 2 iterations, 1 lane), which lands in the tens of milliseconds on
/// typical hardware.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

/// Verifies the password against a PHC string. The comparison of the
/// computed and expected outputs is constant-time.
pub fn validate_password(password: &[u8], expected_password_hash: &str) -> Result<()> {
    let expected_password_hash = PasswordHash::new(expected_password_hash)
        .map_err(|_| ErrorKind::Other("Failed to parse hash in PHC string format.".to_string()))?;
    Argon2::default()
        .verify_password(password, &expected_password_hash)
        .map_err(|_| ErrorKind::InvalidCredentials)?;
    Ok(())
}

/// Creates the operator account unless it already exists. An existing hash is
/// never overwritten, even when the configured password differs.
pub fn ensure_default_credential(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<()> {
    let password_hash = hash_password(password)?;
    if store.upsert_credential_if_absent(username, &password_hash)? {
        tracing::info!(username, "created default operator account");
    } else {
        tracing::debug!(username, "default operator account already present");
    }
    Ok(())
}

/// Checks the username and password against the store.
///
/// Unknown usernames still go through a full hash verification against a
/// throwaway hash so that response times don't reveal which accounts exist.
pub fn authenticate(store: &dyn CredentialStore, username: &str, password: &str) -> bool {
    let stored = match store.lookup_credential_hash(username) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("credential lookup failed: {e}");
            None
        }
    };

    match stored {
        Some(hash) => validate_password(password.as_bytes(), &hash).is_ok(),
        None => {
            if let Some(dummy) = dummy_hash() {
                let _ = validate_password(password.as_bytes(), dummy);
            }
            false
        }
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("not a real password").ok())
        .as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(username: &str, password: &str) -> Database {
        let db = Database::temporary().unwrap();
        ensure_default_credential(&db, username, password).unwrap();
        db
    }

    #[test]
    fn hash_is_salted_phc_string() {
        let a = hash_password("hunter22").unwrap();
        let b = hash_password("hunter22").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(validate_password(b"hunter22", &a).is_ok());
    }

    #[test]
    fn authenticates_matching_credentials() {
        let db = store_with("admin", "changeme");
        assert!(authenticate(&db, "admin", "changeme"));
    }

    #[test]
    fn rejects_single_character_mutations() {
        let db = store_with("admin", "changeme");

        for (i, _) in "changeme".char_indices() {
            let mut password = "changeme".to_string();
            password.replace_range(i..i + 1, "X");
            assert!(!authenticate(&db, "admin", &password), "{password}");
        }
        assert!(!authenticate(&db, "admin", "changem"));
        assert!(!authenticate(&db, "admin", "changemee"));

        for (i, _) in "admin".char_indices() {
            let mut username = "admin".to_string();
            username.replace_range(i..i + 1, "X");
            assert!(!authenticate(&db, &username, "changeme"), "{username}");
        }
    }

    #[test]
    fn unknown_user_is_rejected() {
        let db = Database::temporary().unwrap();
        assert!(!authenticate(&db, "nobody", "changeme"));
    }

    #[test]
    fn bootstrap_never_overwrites_existing_hash() {
        let db = store_with("admin", "first-password");
        let before = db.lookup_credential_hash("admin").unwrap().unwrap();

        ensure_default_credential(&db, "admin", "second-password").unwrap();

        let after = db.lookup_credential_hash("admin").unwrap().unwrap();
        assert_eq!(before, after);
        assert!(authenticate(&db, "admin", "first-password"));
        assert!(!authenticate(&db, "admin", "second-password"));
    }
}
