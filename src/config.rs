use std::env;
use std::path::PathBuf;

use chrono::Duration;

/// Minimum accepted length for the token signing secret.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("{0} must be at least 32 characters long")]
    WeakSecret(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub uri: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upgrade with STARTTLS; off only for local relays.
    pub starttls: bool,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// `None` logs messages instead of sending them.
    pub smtp: Option<SmtpConfig>,
    pub from: String,
}

/// Process-wide settings, loaded once at startup and handed to every
/// component through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub database: DatabaseConfig,
    /// Snapshot directory for the in-memory store; `None` keeps it volatile.
    pub data_dir: Option<PathBuf>,
    pub mail: MailConfig,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Settings with defaults for everything except the signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(1),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            database: DatabaseConfig { uri: None, name: "movieDB".into() },
            data_dir: None,
            mail: MailConfig { smtp: None, from: "no-reply@moviedb.local".into() },
            cors_origins: vec!["http://localhost:5173".into(), "http://localhost:3000".into()],
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret("JWT_SECRET"));
        }
        let mut cfg = Self::new(secret);

        if let Ok(host) = env::var("HOST") {
            cfg.host = host;
        }
        if let Some(port) = parsed_env("PORT")? {
            cfg.port = port;
        }
        if let Some(secs) = parsed_env::<i64>("TOKEN_TTL_SECS")? {
            cfg.token_ttl = Duration::try_seconds(secs)
                .filter(|ttl| *ttl > Duration::zero())
                .ok_or_else(|| ConfigError::Invalid { name: "TOKEN_TTL_SECS", value: secs.to_string() })?;
        }
        if let Some(cost) = parsed_env("BCRYPT_COST")? {
            cfg.bcrypt_cost = cost;
        }
        cfg.database.uri = env::var("MONGODB_URI").ok().filter(|s| !s.is_empty());
        if let Ok(name) = env::var("MONGODB_DB") {
            cfg.database.name = name;
        }
        cfg.data_dir = env::var("DATA_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from);
        if let Some(host) = env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()) {
            cfg.mail.smtp = Some(SmtpConfig {
                host,
                port: parsed_env("SMTP_PORT")?.unwrap_or(587),
                username: env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
                password: env::var("SMTP_PASS").ok(),
                starttls: parsed_env("SMTP_STARTTLS")?.unwrap_or(true),
            });
        }
        if let Ok(from) = env::var("MAIL_FROM") {
            cfg.mail.from = from;
        }
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            cfg.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(cfg)
    }
}

fn parsed_env<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}
