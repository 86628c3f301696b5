use std::str::FromStr;

use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Development,
    Production,
    Test,
}

impl FromStr for AppMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => anyhow::bail!("APP_MODE must be development, production or test, got {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub statement_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: AppMode,
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to mutate
    /// the process environment.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match get("APP_MODE") {
            Some(raw) => raw.parse()?,
            None => AppMode::Production,
        };

        let db = DbConfig {
            url: get("DATABASE_URL").context("DATABASE_URL is not set")?,
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: parse_or(&get, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            statement_timeout_ms: parse_or(&get, "DB_STATEMENT_TIMEOUT_MS", 5_000)?,
        };

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "dailydiet".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "dailydiet-users".into()),
            ttl_minutes: parse_or(&get, "JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: parse_or(&get, "JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };

        Ok(Self {
            mode,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "APP_PORT", 3333)?,
            db,
            jwt,
        })
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
