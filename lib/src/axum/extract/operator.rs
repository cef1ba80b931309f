use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::Key;
use axum_extra::extract::{CookieJar, PrivateCookieJar};
use chrono::Utc;

use crate::auth::{open_claims, SESSION_COOKIE};
use crate::error::{Error, ErrorKind};

/// Operator with a valid session.
///
/// Used as an extractor it guards a route: requests without a session cookie,
/// or with one that doesn't validate, are rejected with an error that turns
/// into a redirect to the login page.
#[derive(Clone, Debug)]
pub struct Operator {
    pub username: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Operator
where
    Key: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = CookieJar::from_request_parts(parts, state).await?;
        if cookies.get(SESSION_COOKIE).is_none() {
            return Err(ErrorKind::FailedGettingTokenCookie(parts.uri.clone()).into());
        }

        // Cookies that fail decryption are left out of the private jar.
        let jar: PrivateCookieJar<Key> = PrivateCookieJar::from_request_parts(parts, state).await?;
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| open_claims(cookie.value(), Utc::now()))
            .map(|username| Operator { username })
            .ok_or_else(|| ErrorKind::AuthFailed("invalid or expired session".to_string()).into())
    }
}
