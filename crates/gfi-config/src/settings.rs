//! Typed view over the loaded config JSON.
//!
//! Config stores env var NAMES, never secret values. Values are resolved from
//! the environment once, by [`DatabaseSettings::resolve`], and redacted in
//! `Debug` output.

use anyhow::{bail, Context, Result};
use serde_json::Value;

pub const DEFAULT_URL_ENV: &str = "GFI_DATABASE_URL";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;
/// The source cursor and the writes each hold a connection.
pub const MIN_MAX_CONNECTIONS: u32 = 2;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Env var holding a full connection URL. Wins over the parts below when set.
    pub url_env: String,
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    /// Env var NAME holding the password.
    pub password_env: Option<String>,
    pub schema: Option<String>,
    /// `key=value&key=value`, passed through to the server.
    pub connection_attributes: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings {
                url_env: DEFAULT_URL_ENV.to_string(),
                host: None,
                port: DEFAULT_DB_PORT,
                username: None,
                password_env: None,
                schema: None,
                connection_attributes: None,
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
            logging: LoggingSettings {
                filter: DEFAULT_LOG_FILTER.to_string(),
            },
        }
    }
}

/// Non-empty trimmed string at `pointer`; wrong type is an error.
fn read_str_at(config: &Value, pointer: &str) -> Result<Option<String>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let t = s.trim();
            Ok((!t.is_empty()).then(|| t.to_string()))
        }
        Some(other) => bail!("CONFIG_TYPE_ERROR leaf={pointer}: expected string, got {other}"),
    }
}

fn read_u64_at(config: &Value, pointer: &str) -> Result<Option<u64>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .with_context(|| format!("CONFIG_TYPE_ERROR leaf={pointer}: expected unsigned integer, got {v}")),
    }
}

impl ImportSettings {
    /// Read every consumed pointer, falling back to defaults.
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let d = Self::default();

        let port = match read_u64_at(config, "/database/port")? {
            Some(p) => u16::try_from(p)
                .with_context(|| format!("CONFIG_RANGE_ERROR leaf=/database/port: {p} is not a port"))?,
            None => d.database.port,
        };

        let max_connections = match read_u64_at(config, "/database/max_connections")? {
            Some(n) => {
                let n = u32::try_from(n).with_context(|| {
                    format!("CONFIG_RANGE_ERROR leaf=/database/max_connections: {n} too large")
                })?;
                if n < MIN_MAX_CONNECTIONS {
                    bail!(
                        "CONFIG_RANGE_ERROR leaf=/database/max_connections: {n} is below minimum {MIN_MAX_CONNECTIONS}"
                    );
                }
                n
            }
            None => d.database.max_connections,
        };

        Ok(Self {
            database: DatabaseSettings {
                url_env: read_str_at(config, "/database/url_env")?
                    .unwrap_or(d.database.url_env),
                host: read_str_at(config, "/database/host")?,
                port,
                username: read_str_at(config, "/database/username")?,
                password_env: read_str_at(config, "/database/password_env")?,
                schema: read_str_at(config, "/database/schema")?,
                connection_attributes: read_str_at(config, "/database/connection_attributes")?,
                max_connections,
            },
            logging: LoggingSettings {
                filter: read_str_at(config, "/logging/filter")?.unwrap_or(d.logging.filter),
            },
        })
    }
}

/// Connection target after env resolution.
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedDatabase {
    Url(String),
    Parts {
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        schema: Option<String>,
        attributes: Vec<(String, String)>,
    },
}

impl std::fmt::Debug for ResolvedDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedDatabase::Url(_) => f.debug_tuple("Url").field(&"<REDACTED>").finish(),
            ResolvedDatabase::Parts {
                host,
                port,
                username,
                password,
                schema,
                attributes,
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("username", username)
                .field("password", &password.as_ref().map(|_| "<REDACTED>"))
                .field("schema", schema)
                .field("attributes", attributes)
                .finish(),
        }
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

impl DatabaseSettings {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ResolvedDatabase> {
        self.resolve_with(resolve_env)
    }

    /// Resolve with a caller-supplied env lookup. Errors name the env var, never its value.
    pub fn resolve_with<F>(&self, env: F) -> Result<ResolvedDatabase>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env(&self.url_env) {
            return Ok(ResolvedDatabase::Url(url));
        }

        let Some(host) = self.host.clone() else {
            bail!(
                "DB_TARGET_MISSING: env var '{}' is not set and database.host is not configured",
                self.url_env
            );
        };

        let password = match &self.password_env {
            Some(name) => Some(env(name).with_context(|| {
                format!("DB_PASSWORD_MISSING: env var '{name}' (database.password_env) is not set or empty")
            })?),
            None => None,
        };

        let attributes = match &self.connection_attributes {
            Some(raw) => parse_connection_attributes(raw)?,
            None => Vec::new(),
        };

        Ok(ResolvedDatabase::Parts {
            host,
            port: self.port,
            username: self.username.clone(),
            password,
            schema: self.schema.clone(),
            attributes,
        })
    }
}

/// Split `a=1&b=2` into pairs. A leading `?` is ignored; empty segments are skipped.
pub fn parse_connection_attributes(raw: &str) -> Result<Vec<(String, String)>> {
    let raw = raw.trim().trim_start_matches('?');
    let mut out = Vec::new();
    for part in raw.split('&').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((k, v)) = part.split_once('=') else {
            bail!("CONFIG_FORMAT_ERROR leaf=/database/connection_attributes: '{part}' is not key=value");
        };
        let k = k.trim();
        if k.is_empty() {
            bail!("CONFIG_FORMAT_ERROR leaf=/database/connection_attributes: empty key in '{part}'");
        }
        out.push((k.to_string(), v.trim().to_string()));
    }
    Ok(out)
}
