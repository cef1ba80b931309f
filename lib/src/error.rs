use std::backtrace::Backtrace;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};

use http::Uri;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub backtrace: Backtrace,
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            write!(f, ", {}", self.backtrace)?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    #[error("unexpected error")]
    StdIoError(#[from] std::io::Error),

    #[error("config error: {0}")]
    ConfigError(#[from] config::ConfigError),
    /// Tokens signed with an empty key would be trivially forgeable, so the
    /// process refuses to start without one.
    #[error("session secret key is not set")]
    MissingSecretKey,

    #[error("bad input: {0}")]
    BadInput(String),

    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    /// Happens on unauthenticated operator trying to access protected routes.
    /// Gets turned into a response redirecting to the login page.
    #[error("failed getting session cookie for {0}")]
    FailedGettingTokenCookie(Uri),

    #[error("failed to retrieve subscribers: {0}")]
    SubscriberRetrieval(String),
    #[error("failed parsing email address: {0}")]
    EmailParseError(String),
    #[error("failed sending email through smtp: {0}")]
    EmailBadResponse(String),
    #[error("email delivery timed out after {0} seconds")]
    DeliveryTimeout(u64),
    #[error("lettre email error: {0}")]
    LettreEmailError(#[from] lettre::error::Error),
    #[error("lettre smtp error: {0}")]
    LettreSmtpError(#[from] lettre::transport::smtp::Error),

    #[error("sled db error: {0}")]
    SledError(#[from] sled::Error),

    #[error("passwordhash error: {0}")]
    PasswordHashError(#[from] argon2::password_hash::Error),

    #[error("json decode error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("pot decode error: {0}")]
    PotError(#[from] pot::Error),

    #[cfg(feature = "askama")]
    #[error("template error: {0}")]
    TemplateError(#[from] askama::Error),

    #[error("other error: {0}")]
    Other(String),

    #[error("infallible?")]
    Infallible(#[from] Infallible),
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::new(ErrorKind::Other(e))
    }
}

impl From<ErrorKind> for Error {
    fn from(k: ErrorKind) -> Self {
        Self::new(k)
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Error {
                fn from(e: $source) -> Self {
                    Self::new(ErrorKind::$variant(e))
                }
            }
        )*
    };
}

impl_from! {
    std::io::Error => StdIoError,
    config::ConfigError => ConfigError,
    lettre::error::Error => LettreEmailError,
    lettre::transport::smtp::Error => LettreSmtpError,
    sled::Error => SledError,
    argon2::password_hash::Error => PasswordHashError,
    serde_json::Error => JsonError,
    pot::Error => PotError,
    Infallible => Infallible,
}

#[cfg(feature = "askama")]
impl From<askama::Error> for Error {
    fn from(e: askama::Error) -> Self {
        Self::new(ErrorKind::TemplateError(e))
    }
}
