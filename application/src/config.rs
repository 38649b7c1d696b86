//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use service::domain::user;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Service configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    /// Service tasks configuration.
    pub tasks: Tasks,

    /// Users management configuration.
    pub users: Users,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            tasks:
                Tasks {
                    release_expired_reservations,
                },
            users: Users { deletion_policy },
        } = value;
        Self {
            release_expired_reservations:
                service::task::release_expired_reservations::Config {
                    interval: release_expired_reservations.interval,
                },
            user_deletion_policy: deletion_policy.into(),
        }
    }
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `ReleaseExpiredReservations` task configuration.
    pub release_expired_reservations: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Users management configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Users {
    /// What happens to the listings of a deleted user.
    pub deletion_policy: DeletionPolicy,
}

/// Policy of deleting users owning listings.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeletionPolicy {
    /// Users owning listings cannot be deleted.
    #[default]
    Restrict,

    /// Listings are deleted along with their owner.
    Cascade,

    /// Users are only marked as deleted.
    SoftDelete,
}

impl From<DeletionPolicy> for user::DeletionPolicy {
    fn from(value: DeletionPolicy) -> Self {
        match value {
            DeletionPolicy::Restrict => Self::Restrict,
            DeletionPolicy::Cascade => Self::Cascade,
            DeletionPolicy::SoftDelete => Self::SoftDelete,
        }
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("marketplace".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use config::{ConfigBuilder, File, FileFormat};

    use super::{Config, DeletionPolicy, LogLevel};

    fn parse(toml: &str) -> Config {
        ConfigBuilder::<config::builder::DefaultState>::default()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_missing_sections() {
        let conf = parse("");

        assert_eq!(
            conf.service.tasks.release_expired_reservations.interval,
            Duration::from_secs(60),
        );
        assert!(matches!(
            conf.service.users.deletion_policy,
            DeletionPolicy::Restrict,
        ));
        assert!(matches!(conf.log.level, LogLevel::Info));
        assert_eq!(conf.postgres.port, 5432);
    }

    #[test]
    fn reads_provided_values() {
        let conf = parse(
            r#"
            [service.tasks.release_expired_reservations]
            interval = "5m"

            [service.users]
            deletion_policy = "SOFT_DELETE"

            [log]
            level = "DEBUG"
            "#,
        );

        assert_eq!(
            conf.service.tasks.release_expired_reservations.interval,
            Duration::from_secs(5 * 60),
        );
        assert!(matches!(
            conf.service.users.deletion_policy,
            DeletionPolicy::SoftDelete,
        ));
        assert!(matches!(conf.log.level, LogLevel::Debug));
    }
}
