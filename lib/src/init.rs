//! Startup procedures.
//!
//! Anything failing here means the application can't run safely, so errors
//! are meant to abort the process.

use crate::auth::{self, CredentialStore};
use crate::{Config, Result};

/// Validates the config and provides the initial state it describes.
pub fn initialize(config: &Config, store: &dyn CredentialStore) -> Result<()> {
    config.validate()?;
    auth::ensure_default_credential(
        store,
        &config.auth.admin_username,
        &config.auth.admin_password,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Auth;
    use crate::{Database, ErrorKind};

    #[test]
    fn refuses_to_start_without_secret_key() {
        let db = Database::temporary().unwrap();
        let result = initialize(&Config::default(), &db);
        assert!(matches!(
            result.map_err(|e| e.kind),
            Err(ErrorKind::MissingSecretKey)
        ));
        assert_eq!(db.lookup_credential_hash("admin").unwrap(), None);
    }

    #[test]
    fn creates_configured_operator() {
        let db = Database::temporary().unwrap();
        let config = Config {
            auth: Auth {
                secret_key: "s3cret".to_string(),
                admin_username: "root".to_string(),
                admin_password: "toor".to_string(),
            },
            ..Default::default()
        };
        initialize(&config, &db).unwrap();
        assert!(auth::authenticate(&db, "root", "toor"));
    }
}
