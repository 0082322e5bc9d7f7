use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub connect_attempts: u32,
    pub connect_backoff: Duration,
}

impl DbConfig {
    /// Connect options for the configured database.
    pub fn connect_options(&self) -> PgConnectOptions {
        self.options_for(&self.name)
    }

    /// Connect options for the server's maintenance database, used to create
    /// the configured one when it does not exist yet.
    pub fn maintenance_options(&self) -> PgConnectOptions {
        self.options_for("postgres")
    }

    fn options_for(&self, database: &str) -> PgConnectOptions {
        let opts = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(database);
        if self.password.is_empty() {
            opts
        } else {
            opts.password(&self.password)
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub host: String,
    pub port: u16,
    pub allowed_origin: HeaderValue,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let db = DbConfig {
            host: std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into()),
            port: parse_or("DB_PORT", 5432),
            user: std::env::var("DB_USER").unwrap_or_else(|_| "postgres".into()),
            password: std::env::var("DB_PASSWORD").unwrap_or_default(),
            name: std::env::var("DB_NAME").context("DB_NAME must be set")?,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            connect_attempts: parse_or("DB_CONNECT_ATTEMPTS", 5),
            connect_backoff: Duration::from_millis(parse_or("DB_CONNECT_BACKOFF_MS", 500)),
        };

        let origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".into());
        let allowed_origin = HeaderValue::from_str(&origin)
            .with_context(|| format!("CORS_ORIGIN is not a valid header value: {origin}"))?;

        Ok(Self {
            db,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("PORT", 5000),
            allowed_origin,
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)),
        })
    }

    pub fn for_tests() -> Self {
        Self {
            db: DbConfig {
                host: "localhost".into(),
                port: 5432,
                user: "postgres".into(),
                password: "postgres".into(),
                name: "signup_test".into(),
                max_connections: 2,
                connect_attempts: 1,
                connect_backoff: Duration::from_millis(10),
            },
            host: "127.0.0.1".into(),
            port: 0,
            allowed_origin: HeaderValue::from_static("http://localhost:5173"),
            request_timeout: Duration::from_secs(5),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
