//! Application configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment variables. Numeric environment values that fail to parse are
//! ignored and the previous layer's value is kept.

use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::error::{AppError, Result};

/// How a requested action slug is matched against the decoded permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantMatch {
    /// Exact membership after stripping a leading `/`.
    #[default]
    Exact,
    /// Substring containment over the raw decoded grant (legacy clients).
    Contains,
}

impl FromStr for GrantMatch {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(GrantMatch::Exact),
            "contains" => Ok(GrantMatch::Contains),
            other => Err(AppError::Config(format!("unknown grant match mode: {other}"))),
        }
    }
}

/// HTTP listener settings. Timeouts are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    /// Bound on receiving a request body
    #[serde(rename = "read_to")]
    pub read_timeout: u64,
    /// Bound on streaming a response body
    #[serde(rename = "write_to")]
    pub write_timeout: u64,
    /// Upper bound on a single request, store calls included
    pub request_timeout_secs: u64,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            read_timeout: 25,
            write_timeout: 25,
            request_timeout_secs: 25,
        }
    }
}

impl ListenConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Postgres connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    #[serde(rename = "db_name")]
    pub name: String,
    pub ssl_mode: String,
    #[serde(rename = "user")]
    pub username: String,
    pub password: String,
    /// Full connection URL; takes precedence over the individual parts
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Pooled connections idle longer than this are closed
    pub idle_timeout_secs: u64,
}

redacted_debug!(DatabaseConfig {
    show host,
    show port,
    show name,
    show ssl_mode,
    show username,
    redact password,
    redact_option url,
    show max_connections,
    show min_connections,
    show acquire_timeout_secs,
    show idle_timeout_secs,
});

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5433,
            name: "postgres".into(),
            ssl_mode: "disable".into(),
            username: "postgres".into(),
            password: "password".into(),
            url: None,
            max_connections: 20,
            min_connections: 2,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
        }
    }
}

impl DatabaseConfig {
    /// Connection options for the pool. A full `url` wins over the parts,
    /// which are passed as-is so reserved characters need no escaping.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url)
                .map_err(|e| AppError::Config(format!("invalid database url: {e}")));
        }
        let ssl_mode = PgSslMode::from_str(&self.ssl_mode)
            .map_err(|e| AppError::Config(format!("invalid ssl mode: {e}")))?;

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(ssl_mode))
    }
}

/// Token settings. `access_exp` is in hours, `refresh_exp` in days.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub access_exp: u32,
    pub refresh_exp: u32,
    pub grant_match: GrantMatch,
}

redacted_debug!(JwtConfig {
    redact secret,
    show access_exp,
    show refresh_exp,
    show grant_match,
});

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "mysecret".into(),
            access_exp: 15,
            refresh_exp: 7,
            grant_match: GrantMatch::Exact,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: ListenConfig,
    pub db: DatabaseConfig,
    pub jwt: JwtConfig,
    /// Fixed bcrypt work factor for password hashes
    pub password_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            db: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    /// Load defaults, then the YAML file at `path` (if present), then the
    /// process environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_yaml(&raw)?,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "cannot load config file, using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| AppError::Config(format!("invalid config file: {e}")))
    }

    /// Overlay environment values obtained through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_with(&lookup, "LISTEN_HOST", &mut self.listen.host);
        override_with(&lookup, "LISTEN_PORT", &mut self.listen.port);
        override_with(&lookup, "LISTEN_READ_TIMEOUT", &mut self.listen.read_timeout);
        override_with(&lookup, "LISTEN_WRITE_TIMEOUT", &mut self.listen.write_timeout);
        override_with(&lookup, "LISTEN_REQUEST_TIMEOUT", &mut self.listen.request_timeout_secs);

        override_with(&lookup, "DB_HOST", &mut self.db.host);
        override_with(&lookup, "DB_PORT", &mut self.db.port);
        override_with(&lookup, "DB_NAME", &mut self.db.name);
        override_with(&lookup, "DB_SSL", &mut self.db.ssl_mode);
        override_with(&lookup, "DB_USER", &mut self.db.username);
        override_with(&lookup, "DB_PASSWORD", &mut self.db.password);
        override_with(&lookup, "DB_IDLE_TIMEOUT", &mut self.db.idle_timeout_secs);
        if let Some(url) = lookup("DATABASE_URL") {
            self.db.url = Some(url);
        }

        override_with(&lookup, "JWT_SECRET", &mut self.jwt.secret);
        override_with(&lookup, "JWT_ACCESS_TOKEN_EXP_TIME", &mut self.jwt.access_exp);
        override_with(&lookup, "JWT_REFRESH_TOKEN_EXP_TIME", &mut self.jwt.refresh_exp);
        override_with(&lookup, "JWT_GRANT_MATCH", &mut self.jwt.grant_match);

        override_with(&lookup, "PASSWORD_COST", &mut self.password_cost);
    }

    /// Reject values the session manager cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.jwt.secret.is_empty() {
            return Err(AppError::Config("JWT secret must not be empty".into()));
        }
        if self.jwt.access_exp == 0 {
            return Err(AppError::Config("access token expiry must be at least one hour".into()));
        }
        if self.listen.read_timeout == 0 || self.listen.write_timeout == 0 {
            return Err(AppError::Config("listener timeouts must be at least one second".into()));
        }
        if self.jwt.refresh_exp == 0 {
            return Err(AppError::Config("refresh token expiry must be at least one day".into()));
        }
        if !(4..=31).contains(&self.password_cost) {
            return Err(AppError::Config(format!(
                "password cost {} outside bcrypt range 4..=31",
                self.password_cost
            )));
        }
        Ok(())
    }
}

fn override_with<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(parsed) = lookup(key).and_then(|raw| raw.parse().ok()) {
        *slot = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen.addr(), "127.0.0.1:8080");
        assert_eq!(config.db.port, 5433);
        assert_eq!(config.jwt.refresh_exp, 7);
        assert_eq!(config.jwt.access_exp, 15);
        assert_eq!(config.jwt.grant_match, GrantMatch::Exact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_overrides_only_given_keys() {
        let raw = r#"
listen:
  port: 9090
jwt:
  secret: from-file
  refresh_exp: 3
  grant_match: contains
"#;
        let config = Config::from_yaml(raw).unwrap();
        assert_eq!(config.listen.port, 9090);
        assert_eq!(config.listen.host, "127.0.0.1");
        assert_eq!(config.jwt.secret, "from-file");
        assert_eq!(config.jwt.refresh_exp, 3);
        assert_eq!(config.jwt.access_exp, 15);
        assert_eq!(config.jwt.grant_match, GrantMatch::Contains);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = Config::from_yaml("listen: [not, a, map]").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_env_overrides_and_ignores_garbage() {
        let mut config = Config::default();
        config.apply_env(lookup_from(&[
            ("JWT_SECRET", "env-secret"),
            ("LISTEN_PORT", "not-a-number"),
            ("DB_PORT", "5432"),
            ("JWT_ACCESS_TOKEN_EXP_TIME", "2"),
            ("JWT_GRANT_MATCH", "CONTAINS"),
        ]));
        assert_eq!(config.jwt.secret, "env-secret");
        assert_eq!(config.listen.port, 8080);
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.jwt.access_exp, 2);
        assert_eq!(config.jwt.grant_match, GrantMatch::Contains);
    }

    #[test]
    fn test_connect_options_from_parts() {
        let options = Config::default().db.connect_options().unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_username(), "postgres");
        assert_eq!(options.get_database(), Some("postgres"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Disable));
    }

    #[test]
    fn test_reserved_characters_in_password_keep_host_and_database() {
        let mut config = Config::default();
        config.db.password = "p@ss/w#rd:1".into();
        config.db.username = "app:user".into();
        let options = config.db.connect_options().unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_database(), Some("postgres"));
        assert_eq!(options.get_username(), "app:user");
    }

    #[test]
    fn test_database_url_takes_precedence() {
        let mut config = Config::default();
        config.apply_env(lookup_from(&[("DATABASE_URL", "postgres://u:p@db:6543/rbac")]));
        let options = config.db.connect_options().unwrap();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("rbac"));
    }

    #[test]
    fn test_bad_ssl_mode_is_config_error() {
        let mut config = Config::default();
        config.db.ssl_mode = "sometimes".into();
        assert!(matches!(config.db.connect_options(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_listener_timeouts_from_yaml_and_env() {
        let mut config = Config::from_yaml("listen:\n  read_to: 5\n  write_to: 7\n").unwrap();
        assert_eq!(config.listen.read_timeout, 5);
        assert_eq!(config.listen.write_timeout, 7);
        config.apply_env(lookup_from(&[("LISTEN_WRITE_TIMEOUT", "9"), ("DB_IDLE_TIMEOUT", "30")]));
        assert_eq!(config.listen.write_timeout, 9);
        assert_eq!(config.db.idle_timeout_secs, 30);

        config.listen.read_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unusable_values() {
        let mut config = Config::default();
        config.jwt.secret.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.jwt.refresh_exp = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.password_cost = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::default();
        let output = format!("{:?}", config);
        assert!(!output.contains("mysecret"));
        assert!(!output.contains("\"password\""));
        assert!(output.contains("[REDACTED]"));
    }
}
