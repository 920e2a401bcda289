//! Application settings loaded via OrthoConfig and the derived server config.
//!
//! Settings merge CLI arguments, `CONTACTS_*` environment variables and config
//! files. Unset values fall back to the defaults exposed by the accessors.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use contacts_backend::outbound::persistence::{PoolConfig, RetryPolicy};
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:4201", "http://localhost:3000"];
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_INITIAL_BACKOFF_MS: u64 = 200;
const DEFAULT_RETRY_MAX_BACKOFF_SECS: u64 = 30;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value:?}: {message}")]
    InvalidBindAddr { value: String, message: String },
    #[error("unknown persistence backend {0:?}; expected orm, procedures or memory")]
    UnknownPersistence(String),
    #[error("persistence backend {0} requires CONTACTS_DATABASE_URL")]
    MissingDatabaseUrl(PersistenceBackend),
}

/// Storage adapter selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceBackend {
    /// Diesel query builder against PostgreSQL.
    #[default]
    Orm,
    /// PostgreSQL stored functions.
    Procedures,
    /// Process-local store; data is lost on restart.
    Memory,
}

impl PersistenceBackend {
    /// Whether this backend talks to PostgreSQL.
    pub const fn uses_database(self) -> bool {
        matches!(self, Self::Orm | Self::Procedures)
    }
}

impl std::fmt::Display for PersistenceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Orm => "orm",
            Self::Procedures => "procedures",
            Self::Memory => "memory",
        })
    }
}

impl FromStr for PersistenceBackend {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orm" => Ok(Self::Orm),
            "procedures" | "sp" => Ok(Self::Procedures),
            "memory" => Ok(Self::Memory),
            _ => Err(SettingsError::UnknownPersistence(s.to_owned())),
        }
    }
}

/// Configuration values controlling the contacts server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CONTACTS")]
pub struct AppSettings {
    /// PostgreSQL connection URL; required by the database backends.
    pub database_url: Option<String>,
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Storage adapter: `orm`, `procedures` or `memory`.
    pub persistence: Option<String>,
    /// Origins allowed to call the API with credentials. The environment
    /// variable takes a comma-separated list.
    pub allowed_origins: Option<Vec<String>>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub connection_timeout_secs: Option<u64>,
    /// Seconds each storage call may take before it times out.
    pub command_timeout_secs: Option<u64>,
    /// Attempts per storage call, including the first.
    pub retry_max_attempts: Option<u32>,
    /// Delay before the first retry, in milliseconds.
    pub retry_initial_backoff_ms: Option<u64>,
    /// Upper bound for retry delays, in seconds.
    pub retry_max_backoff_secs: Option<u64>,
    /// Apply pending migrations at startup; on unless set to `false`.
    pub run_migrations: Option<bool>,
}

impl AppSettings {
    /// Parse the configured bind address, falling back to the default.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .map_err(|err: std::net::AddrParseError| SettingsError::InvalidBindAddr {
                value: raw.to_owned(),
                message: err.to_string(),
            })
    }

    /// Return the selected storage adapter, defaulting to the ORM adapter.
    pub fn persistence(&self) -> Result<PersistenceBackend, SettingsError> {
        self.persistence
            .as_deref()
            .map_or(Ok(PersistenceBackend::default()), str::parse)
    }

    /// Return the database URL required by `backend`.
    pub fn database_url_for(&self, backend: PersistenceBackend) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl(backend))
    }

    /// Return the CORS origins, trimmed and without empty entries.
    ///
    /// Entries that still contain commas are split, so a list given as one
    /// string behaves like the same list given item by item.
    pub fn allowed_origins(&self) -> Vec<String> {
        match &self.allowed_origins {
            Some(origins) => origins
                .iter()
                .flat_map(|entry| entry.split(','))
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.map(str::to_owned).to_vec(),
        }
    }

    /// Whether pending migrations are applied at startup.
    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    /// Whether startup must migrate the schema used by `backend`.
    pub fn migrates_on_startup(&self, backend: PersistenceBackend) -> bool {
        backend.uses_database() && self.run_migrations()
    }

    /// Build the connection pool configuration for `database_url`.
    pub fn pool_config(&self, database_url: &str) -> PoolConfig {
        PoolConfig::new(database_url)
            .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE))
            .with_connection_timeout(Duration::from_secs(
                self.connection_timeout_secs
                    .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS),
            ))
    }

    /// Build the retry policy applied to every storage call.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(
                self.retry_max_attempts
                    .unwrap_or(DEFAULT_RETRY_MAX_ATTEMPTS),
            )
            .with_initial_backoff(Duration::from_millis(
                self.retry_initial_backoff_ms
                    .unwrap_or(DEFAULT_RETRY_INITIAL_BACKOFF_MS),
            ))
            .with_max_backoff(Duration::from_secs(
                self.retry_max_backoff_secs
                    .unwrap_or(DEFAULT_RETRY_MAX_BACKOFF_SECS),
            ))
            .with_operation_timeout(Duration::from_secs(
                self.command_timeout_secs
                    .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
            ))
    }
}

/// Values needed to bind and serve the HTTP application.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Derive the server configuration from loaded settings.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            allowed_origins: settings.allowed_origins(),
        })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and defaults.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 11] = [
        "CONTACTS_DATABASE_URL",
        "CONTACTS_BIND_ADDR",
        "CONTACTS_PERSISTENCE",
        "CONTACTS_ALLOWED_ORIGINS",
        "CONTACTS_POOL_MAX_SIZE",
        "CONTACTS_CONNECTION_TIMEOUT_SECS",
        "CONTACTS_COMMAND_TIMEOUT_SECS",
        "CONTACTS_RETRY_MAX_ATTEMPTS",
        "CONTACTS_RETRY_INITIAL_BACKOFF_MS",
        "CONTACTS_RETRY_MAX_BACKOFF_SECS",
        "CONTACTS_RUN_MIGRATIONS",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("contacts-backend")])
            .expect("config should load")
    }

    fn cleared_env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(cleared_env_with(&[]));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::from(([0, 0, 0, 0], 8080)))
        );
        assert_eq!(settings.persistence(), Ok(PersistenceBackend::Orm));
        assert_eq!(
            settings.allowed_origins(),
            vec!["http://localhost:4201", "http://localhost:3000"]
        );
        assert!(settings.run_migrations());
        assert!(settings.migrates_on_startup(PersistenceBackend::Orm));
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
        let pool = settings.pool_config("postgres://localhost/contacts");
        assert_eq!(pool.max_size(), 10);
        assert_eq!(pool.connection_timeout(), Duration::from_secs(30));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_env_with(&[
            ("CONTACTS_DATABASE_URL", "postgres://db/contacts"),
            ("CONTACTS_BIND_ADDR", "127.0.0.1:9000"),
            ("CONTACTS_PERSISTENCE", "procedures"),
            ("CONTACTS_ALLOWED_ORIGINS", "https://a.example,https://b.example"),
            ("CONTACTS_RETRY_MAX_ATTEMPTS", "2"),
            ("CONTACTS_COMMAND_TIMEOUT_SECS", "5"),
            ("CONTACTS_RUN_MIGRATIONS", "false"),
        ]));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::from(([127, 0, 0, 1], 9000)))
        );
        assert_eq!(settings.persistence(), Ok(PersistenceBackend::Procedures));
        assert_eq!(
            settings.database_url_for(PersistenceBackend::Procedures),
            Ok("postgres://db/contacts")
        );
        assert_eq!(
            settings.allowed_origins(),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!settings.run_migrations());
        assert!(!settings.migrates_on_startup(PersistenceBackend::Procedures));
        let policy = settings.retry_policy();
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.operation_timeout(), Duration::from_secs(5));
    }

    fn bare_settings() -> AppSettings {
        AppSettings {
            database_url: None,
            bind_addr: None,
            persistence: None,
            allowed_origins: None,
            pool_max_size: None,
            connection_timeout_secs: None,
            command_timeout_secs: None,
            retry_max_attempts: None,
            retry_initial_backoff_ms: None,
            retry_max_backoff_secs: None,
            run_migrations: None,
        }
    }

    #[rstest]
    fn single_origin_from_environment_loads() {
        let _guard = lock_env(cleared_env_with(&[(
            "CONTACTS_ALLOWED_ORIGINS",
            "https://only.example",
        )]));

        let settings = load_from_empty_args();

        assert_eq!(settings.allowed_origins(), vec!["https://only.example"]);
    }

    #[rstest]
    fn origin_entries_are_trimmed_and_split() {
        let settings = AppSettings {
            allowed_origins: Some(vec![
                " https://a.example ".to_owned(),
                String::new(),
                "https://b.example, https://c.example,".to_owned(),
            ]),
            ..bare_settings()
        };

        assert_eq!(
            settings.allowed_origins(),
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
    }

    #[rstest]
    #[case(PersistenceBackend::Orm, None, true)]
    #[case(PersistenceBackend::Procedures, None, true)]
    #[case(PersistenceBackend::Orm, Some(true), true)]
    #[case(PersistenceBackend::Orm, Some(false), false)]
    #[case(PersistenceBackend::Memory, None, false)]
    #[case(PersistenceBackend::Memory, Some(true), false)]
    fn startup_migration_decision(
        #[case] backend: PersistenceBackend,
        #[case] run_migrations: Option<bool>,
        #[case] expected: bool,
    ) {
        let settings = AppSettings {
            run_migrations,
            ..bare_settings()
        };

        assert_eq!(settings.migrates_on_startup(backend), expected);
    }

    #[rstest]
    fn database_backends_require_a_url() {
        let _guard = lock_env(cleared_env_with(&[("CONTACTS_DATABASE_URL", "  ")]));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.database_url_for(PersistenceBackend::Orm),
            Err(SettingsError::MissingDatabaseUrl(PersistenceBackend::Orm))
        );
    }

    #[rstest]
    #[case("orm", PersistenceBackend::Orm)]
    #[case("PROCEDURES", PersistenceBackend::Procedures)]
    #[case("sp", PersistenceBackend::Procedures)]
    #[case(" memory ", PersistenceBackend::Memory)]
    fn persistence_names_parse(#[case] raw: &str, #[case] expected: PersistenceBackend) {
        assert_eq!(raw.parse::<PersistenceBackend>(), Ok(expected));
    }

    #[rstest]
    fn unknown_persistence_is_rejected() {
        assert_eq!(
            "mongo".parse::<PersistenceBackend>(),
            Err(SettingsError::UnknownPersistence("mongo".to_owned()))
        );
    }

    #[rstest]
    fn memory_backend_needs_no_database() {
        assert!(!PersistenceBackend::Memory.uses_database());
        assert!(PersistenceBackend::Orm.uses_database());
    }
}
