use std::env;
use std::path::Path;

use crate::error::GlasspaneError;

/// Seed the process environment from a `.env` file.
///
/// With an explicit path the file must exist. Without one, the usual dotenv
/// discovery runs and a missing file is fine.
pub fn load_env_file(path: Option<&Path>) -> Result<(), GlasspaneError> {
    match path {
        Some(p) => {
            dotenvy::from_path(p).map_err(|e| {
                GlasspaneError::Config(format!("cannot load env file {}: {e}", p.display()))
            })?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

/// Neo4j connection parameters.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Neo4jConfig {
    /// Load from environment variables. The `NEO_*` names written by the
    /// old core `.env` files are accepted as fallbacks.
    pub fn from_env() -> Result<Self, GlasspaneError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GlasspaneError> {
        Ok(Self {
            uri: required(&lookup, &["NEO4J_URI", "NEO_URL"])?,
            user: required(&lookup, &["NEO4J_USER", "NEO_USER"])?,
            password: required(&lookup, &["NEO4J_PASSWORD", "NEO_PASS"])?,
            database: optional(&lookup, "NEO4J_DATABASE").unwrap_or_else(|| "neo4j".to_string()),
        })
    }

    pub fn log_redacted(&self) {
        tracing::info!("Neo4j config loaded:");
        tracing::info!("  uri: {}", self.uri);
        tracing::info!("  user: {}", self.user);
        tracing::info!("  password: {}", preview(&self.password));
        tracing::info!("  database: {}", self.database);
    }
}

/// Postgres connection parameters.
#[derive(Debug, Clone)]
pub enum PgConfig {
    /// A full `postgres://` connection string.
    Url(String),
    /// Discrete libpq-style parameters.
    Params {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
}

impl PgConfig {
    /// `DATABASE_URL` wins; otherwise the `PG*` variables are required.
    pub fn from_env() -> Result<Self, GlasspaneError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GlasspaneError> {
        if let Some(url) = optional(&lookup, "DATABASE_URL") {
            return Ok(Self::Url(url));
        }

        let port = match optional(&lookup, "PGPORT") {
            Some(p) => p
                .parse()
                .map_err(|_| GlasspaneError::Config(format!("PGPORT must be a number, got {p:?}")))?,
            None => 5432,
        };

        Ok(Self::Params {
            host: optional(&lookup, "PGHOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            user: required(&lookup, &["PGUSER"])?,
            password: required(&lookup, &["PGPASSWORD"])?,
            database: required(&lookup, &["PGDATABASE"])?,
        })
    }

    pub fn log_redacted(&self) {
        tracing::info!("Postgres config loaded:");
        match self {
            Self::Url(url) => tracing::info!("  DATABASE_URL: {}", preview(url)),
            Self::Params {
                host,
                port,
                user,
                password,
                database,
            } => {
                tracing::info!("  host: {host}:{port}");
                tracing::info!("  user: {user}");
                tracing::info!("  password: {}", preview(password));
                tracing::info!("  database: {database}");
            }
        }
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    keys: &[&str],
) -> Result<String, GlasspaneError> {
    keys.iter()
        .find_map(|k| optional(lookup, k))
        .ok_or_else(|| {
            GlasspaneError::Config(format!("{} environment variable is required", keys.join(" or ")))
        })
}

fn preview(val: &str) -> String {
    let n = val.chars().take(3).map(char::len_utf8).sum::<usize>();
    format!("{}...({} chars)", &val[..n], val.chars().count())
}
