//! Environment-derived configuration.
//!
//! The recognized variables are deliberately few — this is a bootstrap, not
//! a config framework:
//!
//! | Variable               | Meaning                              | Default     |
//! |------------------------|--------------------------------------|-------------|
//! | `PORT`                 | listen port                          | none        |
//! | `RATE_LIMIT_WINDOW_MS` | rate-limit window duration           | `60000`     |
//! | `RATE_LIMIT_MAX`       | max requests per window per IP       | `100`       |
//! | `UPLOAD_DIR`           | root directory served at `/uploads`  | `"uploads"` |
//!
//! `PORT` has no default on purpose: the core does not decide where you
//! listen. The bootstrap that calls [`Config::from_env`] picks its own
//! fallback.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

const DEFAULT_WINDOW_MS: u64 = 60_000;
const DEFAULT_MAX_REQUESTS: u32 = 100;
const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Resolved server configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Listen port, if set. The core enforces no default.
    pub port: Option<u16>,
    /// Fixed rate-limit window duration.
    pub rate_limit_window: Duration,
    /// Max requests per window per client IP.
    pub rate_limit_max: u32,
    /// Root directory served under the `/uploads` prefix.
    pub upload_dir: PathBuf,
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// Missing variables fall back to defaults; present-but-malformed
    /// values are an [`Error::Config`] — silently ignoring a typo'd
    /// `RATE_LIMIT_MAX` would change throttling behavior unannounced.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with the variable lookup
    /// injected, so tests never touch process-global state.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let port = match get("PORT") {
            Some(raw) => Some(parse(&raw, "PORT")?),
            None => None,
        };

        let window_ms: u64 = match get("RATE_LIMIT_WINDOW_MS") {
            Some(raw) => parse(&raw, "RATE_LIMIT_WINDOW_MS")?,
            None => DEFAULT_WINDOW_MS,
        };

        let rate_limit_max: u32 = match get("RATE_LIMIT_MAX") {
            Some(raw) => parse(&raw, "RATE_LIMIT_MAX")?,
            None => DEFAULT_MAX_REQUESTS,
        };

        let upload_dir =
            PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_owned()));

        Ok(Self {
            port,
            rate_limit_window: Duration::from_millis(window_ms),
            rate_limit_max,
            upload_dir,
        })
    }
}

fn parse<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T, Error> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key}: invalid value `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.port, None);
        assert_eq!(cfg.rate_limit_window, Duration::from_millis(60_000));
        assert_eq!(cfg.rate_limit_max, 100);
        assert_eq!(cfg.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn reads_every_variable() {
        let cfg = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("RATE_LIMIT_WINDOW_MS", "1000"),
            ("RATE_LIMIT_MAX", "2"),
            ("UPLOAD_DIR", "/srv/files"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, Some(8080));
        assert_eq!(cfg.rate_limit_window, Duration::from_millis(1000));
        assert_eq!(cfg.rate_limit_max, 2);
        assert_eq!(cfg.upload_dir, PathBuf::from("/srv/files"));
    }

    #[test]
    fn malformed_number_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("RATE_LIMIT_MAX", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("RATE_LIMIT_MAX")));
    }

    #[test]
    fn malformed_port_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("PORT", "70000")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("PORT")));
    }
}
