//! Database module for handling PostgreSQL connections and operations
//!
//! This module provides connection pooling, configuration, and health checks
//! for the PostgreSQL database.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, Pool, Postgres};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_MAX_CONNECTIONS: u32 = 100;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 5 * 60;
const DEFAULT_MAX_LIFETIME_SECS: u64 = 60 * 60;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database server host
    pub host: String,
    /// Database server port
    pub port: u16,
    /// Role used to log in
    pub user: String,
    /// Password for `user`
    pub password: String,
    /// Database name
    pub database: String,
    /// libpq-style sslmode (`disable`, `prefer`, `require`, ...)
    pub ssl_mode: String,
    /// Session time zone, sent as the `TimeZone` startup option
    pub timezone: Option<String>,
    /// Maximum number of open connections in the pool
    pub max_connections: u32,
    /// How long a connection may sit idle before it is closed
    pub idle_timeout: Duration,
    /// How long a connection may be reused before it is recycled
    pub max_lifetime: Duration,
    /// How long a request waits for a connection before giving up
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "users".to_string(),
            ssl_mode: "disable".to_string(),
            timezone: Some("UTC".to_string()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            max_lifetime: Duration::from_secs(DEFAULT_MAX_LIFETIME_SECS),
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `POSTGRES_HOST` (default: "localhost")
    /// - `POSTGRES_PORT` (default: 5432)
    /// - `POSTGRES_USER` (default: "postgres")
    /// - `POSTGRES_PASSWORD` (default: "postgres")
    /// - `POSTGRES_DB` (default: "users")
    /// - `POSTGRES_SSL` (default: "disable")
    /// - `POSTGRES_TIMEZONE` (default: "UTC")
    /// - `DATABASE_MAX_CONNECTIONS` (default: 100)
    /// - `DATABASE_IDLE_TIMEOUT_SECS` (default: 300)
    /// - `DATABASE_MAX_LIFETIME_SECS` (default: 3600)
    /// - `DATABASE_ACQUIRE_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> DatabaseResult<Self> {
        let defaults = Self::default();

        let port = parse_env("POSTGRES_PORT")?.unwrap_or(defaults.port);

        let max_connections =
            parse_env("DATABASE_MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections);
        if max_connections == 0 {
            return Err(DatabaseError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        let ssl_mode = env::var("POSTGRES_SSL").unwrap_or(defaults.ssl_mode);
        parse_ssl_mode(&ssl_mode)?;

        let timezone = match env::var("POSTGRES_TIMEZONE") {
            Ok(tz) if tz.trim().is_empty() => None,
            Ok(tz) => Some(tz),
            Err(_) => defaults.timezone,
        };

        Ok(Self {
            host: env::var("POSTGRES_HOST").unwrap_or(defaults.host),
            port,
            user: env::var("POSTGRES_USER").unwrap_or(defaults.user),
            password: env::var("POSTGRES_PASSWORD").unwrap_or(defaults.password),
            database: env::var("POSTGRES_DB").unwrap_or(defaults.database),
            ssl_mode,
            timezone,
            max_connections,
            idle_timeout: secs_from_env("DATABASE_IDLE_TIMEOUT_SECS")?
                .unwrap_or(defaults.idle_timeout),
            max_lifetime: secs_from_env("DATABASE_MAX_LIFETIME_SECS")?
                .unwrap_or(defaults.max_lifetime),
            acquire_timeout: secs_from_env("DATABASE_ACQUIRE_TIMEOUT_SECS")?
                .unwrap_or(defaults.acquire_timeout),
        })
    }

    /// Build the driver connection options from the individual settings.
    pub fn connect_options(&self) -> DatabaseResult<PgConnectOptions> {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(parse_ssl_mode(&self.ssl_mode)?)
            .application_name("users");

        if let Some(tz) = &self.timezone {
            options = options.options([("TimeZone", tz.as_str())]);
        }

        Ok(options)
    }

    /// Pool limits applied to every pool built from this configuration.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .idle_timeout(Some(self.idle_timeout))
            .max_lifetime(Some(self.max_lifetime))
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Read and parse an optional variable. A set but unparsable value is an error.
fn parse_env<T>(key: &str) -> DatabaseResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|e| {
            DatabaseError::Configuration(format!("Invalid {} {:?}: {}", key, raw, e))
        }),
        Err(_) => Ok(None),
    }
}

fn secs_from_env(key: &str) -> DatabaseResult<Option<Duration>> {
    Ok(parse_env(key)?.map(Duration::from_secs))
}

fn parse_ssl_mode(mode: &str) -> DatabaseResult<PgSslMode> {
    mode.parse::<PgSslMode>()
        .map_err(|e| DatabaseError::Configuration(format!("Invalid POSTGRES_SSL {:?}: {}", mode, e)))
}

/// Initialize a PostgreSQL connection pool
///
/// The pool connects lazily, so the process can start while the database is
/// still unreachable. Callers find out through [`health_check`].
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<Pool<Postgres>>` - PostgreSQL connection pool or error
pub fn init_pool(config: &DatabaseConfig) -> DatabaseResult<Pool<Postgres>> {
    info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        max_connections = config.max_connections,
        "Initializing database connection pool"
    );

    let pool = config
        .pool_options()
        .connect_lazy_with(config.connect_options()?);

    Ok(pool)
}

/// Check database connectivity
///
/// Runs `SELECT 1` on a pooled connection. Any failure is reported as
/// [`DatabaseError::Connection`]; the pool must not be used for the current
/// unit of work when this returns an error.
pub async fn health_check(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| {
            warn!("Database health check failed: {}", e);
            DatabaseError::Connection(e)
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 11] = [
        "POSTGRES_HOST",
        "POSTGRES_PORT",
        "POSTGRES_USER",
        "POSTGRES_PASSWORD",
        "POSTGRES_DB",
        "POSTGRES_SSL",
        "POSTGRES_TIMEZONE",
        "DATABASE_MAX_CONNECTIONS",
        "DATABASE_IDLE_TIMEOUT_SECS",
        "DATABASE_MAX_LIFETIME_SECS",
        "DATABASE_ACQUIRE_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_database_config_from_env() {
        clear_env();

        let config = DatabaseConfig::from_env().expect("Failed to create database config");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "users");
        assert_eq!(config.ssl_mode, "disable");
        assert_eq!(config.timezone.as_deref(), Some("UTC"));
        assert_eq!(config.max_connections, 100);
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.max_lifetime, Duration::from_secs(3600));
    }

    #[test]
    #[serial]
    fn test_database_config_from_env_with_custom_values() {
        clear_env();
        unsafe {
            std::env::set_var("POSTGRES_HOST", "db.internal");
            std::env::set_var("POSTGRES_PORT", "6543");
            std::env::set_var("POSTGRES_USER", "app");
            std::env::set_var("POSTGRES_PASSWORD", "secret");
            std::env::set_var("POSTGRES_DB", "people");
            std::env::set_var("POSTGRES_SSL", "require");
            std::env::set_var("POSTGRES_TIMEZONE", "Asia/Kolkata");
            std::env::set_var("DATABASE_MAX_CONNECTIONS", "20");
        }

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.user, "app");
        assert_eq!(config.password, "secret");
        assert_eq!(config.database, "people");
        assert_eq!(config.ssl_mode, "require");
        assert_eq!(config.timezone.as_deref(), Some("Asia/Kolkata"));
        assert_eq!(config.max_connections, 20);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_a_configuration_error() {
        clear_env();
        unsafe {
            std::env::set_var("POSTGRES_PORT", "not-a-port");
        }

        let err = DatabaseConfig::from_env().unwrap_err();
        assert!(matches!(err, DatabaseError::Configuration(_)));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_pool_settings_are_configuration_errors() {
        for (var, value) in [
            ("DATABASE_MAX_CONNECTIONS", "lots"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
            ("DATABASE_IDLE_TIMEOUT_SECS", "5m"),
            ("DATABASE_MAX_LIFETIME_SECS", "-1"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "soon"),
        ] {
            clear_env();
            unsafe {
                std::env::set_var(var, value);
            }

            let err = DatabaseConfig::from_env().unwrap_err();
            assert!(
                matches!(err, DatabaseError::Configuration(ref msg) if msg.contains(var)),
                "{}={} gave {:?}",
                var,
                value,
                err
            );
        }

        clear_env();
    }

    #[test]
    #[serial]
    fn test_pool_overrides_from_env() {
        clear_env();
        unsafe {
            std::env::set_var("DATABASE_IDLE_TIMEOUT_SECS", "60");
            std::env::set_var("DATABASE_MAX_LIFETIME_SECS", "120");
            std::env::set_var("DATABASE_ACQUIRE_TIMEOUT_SECS", "2");
        }

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.max_lifetime, Duration::from_secs(120));
        assert_eq!(config.acquire_timeout, Duration::from_secs(2));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_ssl_mode_is_a_configuration_error() {
        clear_env();
        unsafe {
            std::env::set_var("POSTGRES_SSL", "sometimes");
        }

        let err = DatabaseConfig::from_env().unwrap_err();
        assert!(matches!(err, DatabaseError::Configuration(_)));

        clear_env();
    }

    #[test]
    fn test_connect_options() {
        let config = DatabaseConfig {
            host: "db.internal".to_string(),
            port: 6543,
            user: "app".to_string(),
            database: "people".to_string(),
            ..DatabaseConfig::default()
        };

        let options = config.connect_options().unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "app");
        assert_eq!(options.get_database(), Some("people"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Disable));
    }

    #[test]
    fn test_pool_limits() {
        let options = DatabaseConfig::default().pool_options();
        assert_eq!(options.get_max_connections(), 100);
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(3600)));
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_init_pool_is_lazy() {
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            acquire_timeout: Duration::from_millis(200),
            ..DatabaseConfig::default()
        };

        let pool = init_pool(&config).expect("lazy pool construction never connects");
        let err = health_check(&pool).await.unwrap_err();
        assert!(err.is_connection());
    }
}
