//! Environment-driven application configuration.
//!
//! Everything is read once at startup. The session key comes from a file so
//! restarts do not invalidate live cookies; debug builds (or an explicit
//! opt-in) may fall back to an ephemeral key.

use std::env;
use std::fmt;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use actix_web::cookie::Key;
use thiserror::Error;
use tracing::warn;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_DB_PATH: &str = "playground.db";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const MIN_SESSION_KEY_BYTES: usize = 64;

/// Configuration load failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PLAYGROUND_BIND {value:?} is not a socket address")]
    InvalidBind {
        value: String,
        source: AddrParseError,
    },
    #[error("failed to read session key at {path}")]
    SessionKeyUnavailable {
        path: String,
        source: std::io::Error,
    },
    #[error("session key at {path} is {length} bytes; need at least {MIN_SESSION_KEY_BYTES}")]
    SessionKeyTooShort { path: String, length: usize },
}

/// Resolved application settings.
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub session_key: Key,
    pub cookie_secure: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_path", &self.database_path)
            .field("session_key", &"<redacted>")
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl AppConfig {
    /// Load settings from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a variable is present but malformed, or
    /// when the session key file is missing outside debug builds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through an injectable variable lookup. Tests use this to
    /// avoid mutating process-global environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_value = lookup("PLAYGROUND_BIND").unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind_addr = bind_value
            .parse()
            .map_err(|source| ConfigError::InvalidBind {
                value: bind_value,
                source,
            })?;

        let database_path =
            PathBuf::from(lookup("PLAYGROUND_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_owned()));

        let key_path =
            lookup("SESSION_KEY_FILE").unwrap_or_else(|| DEFAULT_SESSION_KEY_FILE.to_owned());
        let allow_ephemeral = lookup("SESSION_ALLOW_EPHEMERAL").as_deref() == Some("1");
        let session_key = load_session_key(&key_path, allow_ephemeral)?;

        let cookie_secure = lookup("SESSION_COOKIE_SECURE")
            .map(|value| value != "0")
            .unwrap_or(true);

        Ok(Self {
            bind_addr,
            database_path,
            session_key,
            cookie_secure,
        })
    }
}

fn load_session_key(path: &str, allow_ephemeral: bool) -> Result<Key, ConfigError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.len() >= MIN_SESSION_KEY_BYTES => Ok(Key::derive_from(&bytes)),
        Ok(bytes) => Err(ConfigError::SessionKeyTooShort {
            path: path.to_owned(),
            length: bytes.len(),
        }),
        Err(source) => {
            if cfg!(debug_assertions) || allow_ephemeral {
                warn!(path, error = %source, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(ConfigError::SessionKeyUnavailable {
                    path: path.to_owned(),
                    source,
                })
            }
        }
    }
}
