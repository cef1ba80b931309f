use std::net::SocketAddr;

use serde::de::DeserializeOwned;

use crate::error::{ErrorKind, Result};

pub static CONFIG_FILE: &'static str = "herald.toml";

/// Application configuration.
///
/// # Sources
///
/// Values are layered in the following order, later sources overriding
/// earlier ones:
///
/// 1. `Config::default()`,
/// 2. `herald.toml` (optional),
/// 3. `secret.herald.toml` (optional, meant to stay out of version control),
/// 4. environment variables, with `__` separating nested keys, e.g.
///    `AUTH__SECRET_KEY` or `EMAIL__SMTP_PORT`.
///
/// Using the *struct update syntax* one can initialize a new `Config`, making
/// a few changes right in the definition.
///
/// ```ignore
/// let cfg = Config {
///     auth: Auth {
///         secret_key: "hunter2".to_string(),
///         ..Default::default()
///     },
///     ..Default::default()
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub name: String,

    /// Address on which to serve the admin panel. Defaults to
    /// `127.0.0.1:5001`.
    pub address: SocketAddr,
    /// Public host (and optional port) of the site the subscribers signed up
    /// at. Used to build unsubscribe links, without the scheme.
    pub base_url: String,
    /// Filesystem path of the sled database.
    pub db_path: String,

    pub tracing: Tracing,
    pub auth: Auth,
    pub email: Email,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            address: SocketAddr::from(([127, 0, 0, 1], 5001)),
            base_url: "localhost:5001".to_string(),
            db_path: "./db".to_string(),
            tracing: Tracing::default(),
            auth: Auth::default(),
            email: Email::default(),
        }
    }
}

impl Config {
    /// Checks the conditions the application can't safely start without.
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret_key.is_empty() {
            return Err(ErrorKind::MissingSecretKey.into());
        }
        Ok(())
    }

    /// Address used in the `From` header and the SMTP envelope. Falls back
    /// to the relay user, which is an address for most providers.
    pub fn sender(&self) -> &str {
        if self.email.address.is_empty() {
            &self.email.smtp_user
        } else {
            &self.email.address
        }
    }
}

/// Loads application config from the default locations.
pub fn load<T: DeserializeOwned>() -> Result<T> {
    load_from(CONFIG_FILE)
}

/// Loads application config using provided file name.
///
/// For example for `name` == `herald.toml` we will load both `herald.toml`
/// and `secret.herald.toml` from the working directory, if present.
pub fn load_from<T: DeserializeOwned>(name: impl AsRef<str>) -> Result<T> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(name.as_ref()).required(false))
        .add_source(config::File::with_name(&format!("secret.{}", name.as_ref())).required(false))
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix_separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Tracing {
    pub enabled: bool,

    pub mode: crate::tracing::Mode,
    pub level: crate::tracing::Level,

    pub loki_address: String,
}

impl Default for Tracing {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: crate::tracing::Mode::default(),
            level: crate::tracing::Level::default(),
            loki_address: "".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Auth {
    /// Secret from which the session encryption key is derived. Must be set.
    pub secret_key: String,

    /// Operator account created on startup if it doesn't exist yet. An
    /// existing account is never overwritten, so changing the password here
    /// after the first start has no effect.
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            admin_username: "admin".to_string(),
            admin_password: "changeme".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Email {
    /// Address that the newsletter is sent from.
    pub address: String,

    // Smtp relay and credentials. Port 465 means implicit TLS, any other port
    // upgrades the connection with STARTTLS.
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
}

impl Default for Email {
    fn default() -> Self {
        Self {
            address: String::new(),
            smtp_server: String::new(),
            smtp_port: 465,
            smtp_user: String::new(),
            smtp_password: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_key_is_fatal() {
        let config = Config::default();
        assert!(matches!(
            config.validate().map_err(|e| e.kind),
            Err(ErrorKind::MissingSecretKey)
        ));

        let config = Config {
            auth: Auth {
                secret_key: "s3cret".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sender_falls_back_to_smtp_user() {
        let mut config = Config::default();
        config.email.smtp_user = "relay@example.com".to_string();
        assert_eq!(config.sender(), "relay@example.com");

        config.email.address = "news@example.com".to_string();
        assert_eq!(config.sender(), "news@example.com");
    }
}
