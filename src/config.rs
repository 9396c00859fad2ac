//! Connection configuration discovery.
//!
//! Resolution order (original behavior, carried over):
//! 1. `ODOO_URL` / `ODOO_DB` / `ODOO_USERNAME` / `ODOO_PASSWORD` — all four
//!    present means the environment wins outright.
//! 2. `./odoo_config.json`, `~/.config/odoo/config.json`,
//!    `~/.odoo_config.json` — first file that exists.
//!
//! `ODOO_TIMEOUT` (seconds, default 30) and `ODOO_VERIFY_SSL` (`1|true|yes`)
//! are read from the environment in either case.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::OdooError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://").unwrap_or_else(|e| panic!("scheme pattern: {e}"))
});

#[derive(Clone, Deserialize)]
pub struct OdooConfig {
    pub url: String,
    pub db: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_verify_ssl() -> bool {
    true
}

// The credential must never leak through logs.
impl fmt::Debug for OdooConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdooConfig")
            .field("url", &self.url)
            .field("db", &self.db)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl OdooConfig {
    /// Resolve configuration from the environment or the first config file
    /// that exists.
    pub fn load() -> Result<Self, OdooError> {
        let mut config = Self::from_env().map_or_else(Self::from_file, Ok)?;

        if let Ok(timeout) = std::env::var("ODOO_TIMEOUT") {
            config.timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| OdooError::Config(format!("invalid ODOO_TIMEOUT: {timeout:?}")))?;
        }
        if let Ok(verify) = std::env::var("ODOO_VERIFY_SSL") {
            config.verify_ssl = is_truthy(&verify);
        }

        Ok(config)
    }

    fn from_env() -> Option<Self> {
        let url = std::env::var("ODOO_URL").ok()?;
        let db = std::env::var("ODOO_DB").ok()?;
        let username = std::env::var("ODOO_USERNAME").ok()?;
        let password = std::env::var("ODOO_PASSWORD").ok()?;
        Some(Self {
            url,
            db,
            username,
            password,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_ssl: true,
        })
    }

    fn from_file() -> Result<Self, OdooError> {
        for path in Self::config_paths() {
            if !path.exists() {
                continue;
            }
            let raw = std::fs::read_to_string(&path).map_err(|e| {
                OdooError::Config(format!("failed to read {}: {e}", path.display()))
            })?;
            return serde_json::from_str(&raw).map_err(|e| {
                OdooError::Config(format!("invalid config file {}: {e}", path.display()))
            });
        }

        Err(OdooError::Config(
            "no Odoo configuration found; create an odoo_config.json file or set \
             ODOO_URL, ODOO_DB, ODOO_USERNAME and ODOO_PASSWORD"
                .into(),
        ))
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./odoo_config.json")];
        if let Ok(home) = std::env::var("HOME") {
            paths.push(PathBuf::from(&home).join(".config/odoo/config.json"));
            paths.push(PathBuf::from(&home).join(".odoo_config.json"));
        }
        paths
    }

    /// Base URL with a guaranteed scheme and no trailing slash.
    pub fn normalized_url(&self) -> String {
        let url = if SCHEME_RE.is_match(&self.url) {
            self.url.clone()
        } else {
            format!("http://{}", self.url)
        };
        url.trim_end_matches('/').to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> OdooConfig {
        OdooConfig {
            url: url.into(),
            db: "db".into(),
            username: "user".into(),
            password: "pw".into(),
            timeout_secs: 30,
            verify_ssl: true,
        }
    }

    #[test]
    fn bare_host_gets_http_scheme() {
        assert_eq!(
            config("odoo.example.com").normalized_url(),
            "http://odoo.example.com"
        );
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(
            config("https://odoo.example.com").normalized_url(),
            "https://odoo.example.com"
        );
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        assert_eq!(
            config("https://odoo.example.com/").normalized_url(),
            "https://odoo.example.com"
        );
    }

    #[test]
    fn truthy_values() {
        for v in ["1", "true", "YES", " yes "] {
            assert!(is_truthy(v));
        }
        for v in ["0", "false", "no", ""] {
            assert!(!is_truthy(v));
        }
    }

    #[test]
    fn debug_never_prints_the_password() {
        let rendered = format!("{:?}", config("https://odoo.example.com"));
        assert!(!rendered.contains("pw"));
        assert!(rendered.contains("***"));
    }
}
