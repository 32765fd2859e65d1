//! Provider credentials
//!
//! Resolution order is explicit values first, then process environment after
//! loading a `.env` file when one exists.

use crate::error::{Error, Result};
use tracing::debug;

/// Environment variable holding the API key id
pub const API_KEY_ID_VAR: &str = "APCA_API_KEY_ID";

/// Environment variable holding the API secret key
pub const API_SECRET_KEY_VAR: &str = "APCA_API_SECRET_KEY";

/// Request header carrying the API key id
pub const API_KEY_ID_HEADER: &str = "APCA-API-KEY-ID";

/// Request header carrying the API secret key
pub const API_SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";

/// API key pair sent with every request
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key_id: String,
    secret_key: String,
}

impl Credentials {
    /// Create credentials from explicit values
    pub fn new(key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Resolve credentials from the environment, loading `.env` first if present
    pub fn from_env() -> Result<Self> {
        match dotenv::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) => debug!("No .env file loaded: {e}"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::missing_credentials(name))
        };

        Ok(Self {
            key_id: fetch(API_KEY_ID_VAR)?,
            secret_key: fetch(API_SECRET_KEY_VAR)?,
        })
    }

    /// The API key id
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The API secret key
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Header pairs to attach to each request
    pub fn headers(&self) -> [(&'static str, &str); 2] {
        [
            (API_KEY_ID_HEADER, self.key_id.as_str()),
            (API_SECRET_KEY_HEADER, self.secret_key.as_str()),
        ]
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let creds = Credentials::from_lookup(lookup(&[
            (API_KEY_ID_VAR, "PKTEST"),
            (API_SECRET_KEY_VAR, "s3cr3t"),
        ]))
        .unwrap();
        assert_eq!(creds.key_id(), "PKTEST");
        assert_eq!(creds.secret_key(), "s3cr3t");
    }

    #[test]
    fn test_from_lookup_missing_secret() {
        let err = Credentials::from_lookup(lookup(&[(API_KEY_ID_VAR, "PKTEST")])).unwrap_err();
        assert!(matches!(err, Error::MissingCredentials { ref variable } if variable == API_SECRET_KEY_VAR));
    }

    #[test]
    fn test_from_lookup_blank_is_missing() {
        let err = Credentials::from_lookup(lookup(&[
            (API_KEY_ID_VAR, "  "),
            (API_SECRET_KEY_VAR, "s3cr3t"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(API_KEY_ID_VAR));
    }

    #[test]
    fn test_headers() {
        let creds = Credentials::new("id", "secret");
        let headers = creds.headers();
        assert_eq!(headers[0], ("APCA-API-KEY-ID", "id"));
        assert_eq!(headers[1], ("APCA-API-SECRET-KEY", "secret"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", Credentials::new("id", "hunter2"));
        assert!(debug.contains("id"));
        assert!(!debug.contains("hunter2"));
    }
}
