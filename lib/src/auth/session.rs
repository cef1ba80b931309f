//! Stateless operator sessions.
//!
//! A session token is the private-cookie encoding of a small claims document
//! (username plus absolute expiry): AES-256-GCM with the cookie name as
//! associated data, keyed from the configured secret. Holders can neither
//! read nor alter it, and any modification fails authentication.
//!
//! # Revocation
//!
//! There is no server-side session table. Logging out only tells the browser
//! to drop the cookie, so a token captured before logout stays valid until
//! its embedded expiry.

use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, CookieJar, Key, SameSite};
use sha2::{Digest, Sha512};

use crate::error::{ErrorKind, Result};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Absolute lifetime of a session in days, counted from issuance.
pub const SESSION_LIFETIME_DAYS: i64 = 7;

pub fn session_lifetime() -> Duration {
    Duration::days(SESSION_LIFETIME_DAYS)
}

#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    username: String,
    expires_at: DateTime<Utc>,
}

/// Issues and validates session tokens. Cheap to clone.
#[derive(Clone)]
pub struct Sessions {
    key: Key,
}

impl std::fmt::Debug for Sessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sessions").finish_non_exhaustive()
    }
}

impl Sessions {
    /// Derives the encryption key from the secret. The secret can be of any
    /// length but must not be empty.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(ErrorKind::MissingSecretKey.into());
        }
        let digest = Sha512::digest(secret.as_bytes());
        Ok(Self {
            key: Key::from(digest.as_slice()),
        })
    }

    /// Key used for encrypting session cookies.
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn issue(&self, username: &str) -> Result<String> {
        self.issue_at(username, Utc::now())
    }

    /// Issues a token valid for [`session_lifetime`] starting at `now`.
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<String> {
        let mut jar = CookieJar::new();
        jar.private_mut(&self.key)
            .add(Cookie::new(SESSION_COOKIE, seal_claims(username, now)?));
        let token = jar
            .get(SESSION_COOKIE)
            .ok_or_else(|| ErrorKind::Other("session cookie missing after encryption".into()))?
            .value()
            .to_string();

        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Option<String> {
        self.validate_at(token, Utc::now())
    }

    /// Returns the username embedded in the token if the token decrypts,
    /// carries a username and hasn't expired at `now`. Every failure is
    /// reported the same way.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(SESSION_COOKIE, token.to_string()));
        let cookie = jar.private(&self.key).get(SESSION_COOKIE)?;
        open_claims(cookie.value(), now)
    }

    /// Session cookie for `username`, still in plaintext. Encrypted once it
    /// goes through a private jar keyed with [`Sessions::key`].
    pub fn cookie(&self, username: &str) -> Result<Cookie<'static>> {
        Ok(Cookie::build((SESSION_COOKIE, seal_claims(username, Utc::now())?))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(cookie::time::Duration::seconds(session_lifetime().num_seconds()))
            .build())
    }
}

/// Serializes the claims of a session starting at `now`.
fn seal_claims(username: &str, now: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
        username: username.to_string(),
        expires_at: now + session_lifetime(),
    };
    Ok(serde_json::to_string(&claims)?)
}

/// Reads the username out of decrypted claims, unless they are malformed,
/// carry no username or have expired at `now`.
pub fn open_claims(value: &str, now: DateTime<Utc>) -> Option<String> {
    let claims: Claims = serde_json::from_str(value).ok()?;
    if claims.username.is_empty() || claims.expires_at <= now {
        return None;
    }
    Some(claims.username)
}

/// Cookie telling the browser to discard its session immediately.
pub fn revocation_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(cookie::time::Duration::ZERO)
        .build()
}
