//! Process configuration and connection descriptors.
//!
//! # Responsibility
//! - Read database and logging settings from the environment.
//! - Turn a DSN string into a `ConnectionDescriptor` the connection manager opens.
//!
//! # Invariants
//! - `DB_URL` takes precedence over `DB_NAME`.
//! - Malformed descriptors are rejected before any file is touched.

use crate::error::{StoreError, StoreResult};
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);
/// Upper bound accepted for `DB_TIMEOUT_SECS`.
pub const MAX_DEADLINE_SECS: u64 = 3_600;
const DATABASE_FILE_EXTENSION: &str = "sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingDatabase,
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDatabase => write!(f, "either DB_URL or DB_NAME is required"),
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Runtime settings for the storage layer and its host process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub data_dir: PathBuf,
    /// Tear the schema down and re-apply it on startup. Destroys data.
    pub reload: bool,
    pub statement_timeout: Duration,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = read("DB_URL");
        let database_name = read("DB_NAME");
        if database_url.is_none() && database_name.is_none() {
            return Err(ConfigError::MissingDatabase);
        }

        let reload = match read("DB_RELOAD") {
            Some(value) => parse_flag("DB_RELOAD", &value)?,
            None => false,
        };

        let statement_timeout = match read("DB_TIMEOUT_SECS") {
            Some(value) => parse_timeout("DB_TIMEOUT_SECS", &value)?,
            None => DEFAULT_DEADLINE,
        };

        Ok(Self {
            database_url,
            database_name,
            data_dir: read("DB_DATA_DIR").map_or_else(|| PathBuf::from("."), PathBuf::from),
            reload,
            statement_timeout,
            log_level: read("LOG_LEVEL").unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read("LOG_DIR").map(PathBuf::from),
        })
    }

    /// Resolves the descriptor the connection manager should open.
    pub fn descriptor(&self) -> StoreResult<ConnectionDescriptor> {
        if let Some(url) = self.database_url.as_deref() {
            return ConnectionDescriptor::parse(url);
        }
        match self.database_name.as_deref() {
            Some(name) => Ok(ConnectionDescriptor::File(
                self.data_dir
                    .join(format!("{}.{DATABASE_FILE_EXTENSION}", name.trim())),
            )),
            None => Err(StoreError::connection(
                "db.open",
                ConfigError::MissingDatabase.to_string(),
            )),
        }
    }
}

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionDescriptor {
    /// Private in-memory database, gone when the connection closes.
    Memory,
    File(PathBuf),
    /// SQLite `file:` URI, passed to the driver verbatim.
    Uri(String),
}

impl ConnectionDescriptor {
    /// Parses a DSN.
    ///
    /// Accepted forms: `:memory:`, `sqlite::memory:`, `sqlite://<path>`,
    /// `sqlite:<path>`, `file:<uri>` and bare filesystem paths.
    pub fn parse(dsn: &str) -> StoreResult<Self> {
        let trimmed = dsn.trim();
        if trimmed.is_empty() {
            return Err(StoreError::connection("db.open", "empty connection descriptor"));
        }

        if trimmed == ":memory:" || trimmed == "sqlite::memory:" {
            return Ok(Self::Memory);
        }
        if trimmed.starts_with("file:") {
            return Ok(Self::Uri(trimmed.to_string()));
        }

        let path = if let Some(rest) = trimmed.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = trimmed.strip_prefix("sqlite:") {
            rest
        } else if let Some((scheme, _)) = trimmed.split_once("://") {
            return Err(StoreError::connection(
                "db.open",
                format!("unsupported scheme `{scheme}`; expected sqlite or file"),
            ));
        } else {
            trimmed
        };

        if path.is_empty() {
            return Err(StoreError::connection(
                "db.open",
                format!("descriptor `{trimmed}` has no database path"),
            ));
        }
        if path == ":memory:" {
            return Ok(Self::Memory);
        }
        Ok(Self::File(PathBuf::from(path)))
    }

    /// Short label for log events.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
            Self::Uri(_) => "uri",
        }
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a boolean",
        }),
    }
}

fn parse_timeout(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_DEADLINE_SECS).contains(&secs) => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected whole seconds between 1 and 3600",
        }),
    }
}
