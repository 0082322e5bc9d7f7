use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, PgConnection, PgPool,
};
use tracing::{debug, info, warn};

use crate::{
    config::DbConfig,
    registration::repo_types::{NewUser, UserId, UserRecord},
    storage::{StoreError, UserStore},
};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

// pg_advisory_xact_lock key guarding DDL on `users`.
const SCHEMA_LOCK_KEY: i64 = 0x7573_6572_73;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
        first_name VARCHAR(255) NOT NULL,
        last_name VARCHAR(255) NOT NULL,
        username VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        age VARCHAR(3) NOT NULL,
        phone VARCHAR(20) NOT NULL,
        address TEXT NOT NULL,
        city VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

// Email uniqueness ignores case; the column keeps what the client sent.
const CREATE_EMAIL_INDEX: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_key ON users (lower(email))
"#;

const SCHEMA_PRESENT: &str = r#"
    SELECT to_regclass('public.users') IS NOT NULL
       AND to_regclass('public.users_email_lower_key') IS NOT NULL
"#;

/// Connect to the configured database, creating it first if needed.
///
/// Failed attempts are retried with exponential backoff up to
/// `connect_attempts` times before giving up.
pub async fn connect_with_retry(cfg: &DbConfig) -> anyhow::Result<PgPool> {
    let attempts = cfg.connect_attempts.max(1);
    let mut attempt = 1;
    loop {
        match connect(cfg).await {
            Ok(pool) => {
                info!(database = %cfg.name, attempt, "database connection successful");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                let delay = backoff_delay(cfg.connect_backoff, attempt);
                warn!(error = %e, attempt, ?delay, "database connection failed; retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e.context(format!("database unreachable after {attempt} attempts")));
            }
        }
    }
}

async fn connect(cfg: &DbConfig) -> anyhow::Result<PgPool> {
    ensure_database(cfg).await?;
    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_with(cfg.connect_options())
        .await
        .context("connect to database")
}

/// Delay before retry number `attempt` (1-based), doubling from `base` and
/// capped at thirty seconds.
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Make sure the configured database exists.
pub async fn ensure_database(cfg: &DbConfig) -> anyhow::Result<()> {
    ensure_database_with(&cfg.connect_options(), &cfg.maintenance_options(), &cfg.name).await
}

/// Connect to `target` directly; only when the server reports it missing
/// (`3D000`) go through `maintenance` and create `name`.
pub async fn ensure_database_with(
    target: &PgConnectOptions,
    maintenance: &PgConnectOptions,
    name: &str,
) -> anyhow::Result<()> {
    match PgConnection::connect_with(target).await {
        Ok(conn) => {
            conn.close().await.ok();
            debug!(database = %name, "database already exists");
            return Ok(());
        }
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("3D000") => {
            info!(database = %name, "database missing; creating it");
        }
        Err(e) => return Err(anyhow::Error::new(e).context("connect to database")),
    }

    let mut conn = PgConnection::connect_with(maintenance)
        .await
        .context("connect to maintenance database")?;

    let stmt = format!("CREATE DATABASE {}", quote_ident(name));
    let res = match sqlx::query(&stmt).execute(&mut conn).await {
        Ok(_) => {
            info!(database = %name, "database created");
            Ok(())
        }
        // Another instance created it in the meantime.
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("42P04") => {
            debug!(database = %name, "database already exists");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("create database")),
    };

    conn.close().await.ok();
    res
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Log whether `users` exists and how many rows it holds.
pub async fn log_table_state(pool: &PgPool) {
    let exists = sqlx::query_scalar::<_, bool>("SELECT to_regclass('public.users') IS NOT NULL")
        .fetch_one(pool)
        .await;
    match exists {
        Ok(true) => match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
        {
            Ok(rows) => info!(rows, "users table present"),
            Err(e) => warn!(error = %e, "count users failed"),
        },
        Ok(false) => info!("users table absent; it will be created on first registration"),
        Err(e) => warn!(error = %e, "checking users table failed"),
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        // Catalog lookup only, so steady-state requests take no table locks.
        let present = sqlx::query_scalar::<_, bool>(SCHEMA_PRESENT)
            .fetch_one(&self.db)
            .await
            .context("check schema")?;
        if present {
            return Ok(());
        }

        let mut tx = self.db.begin().await.context("begin schema tx")?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .context("lock schema")?;
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&mut *tx)
            .await
            .context("create users table")?;
        sqlx::query(CREATE_EMAIL_INDEX)
            .execute(&mut *tx)
            .await
            .context("create email index")?;
        tx.commit().await.context("commit schema tx")?;
        Ok(())
    }

    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError> {
        let res = sqlx::query_scalar::<_, UserId>(
            r#"
            INSERT INTO users (first_name, last_name, username, email, password, age, phone, address, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.age)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.city)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(id) => Ok(id),
            // email (any case) is the only unique value besides the identity key
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(StoreError::Backend(anyhow::Error::new(e).context("insert user"))),
        }
    }

    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, first_name, last_name, username, email, password, age, phone, address, city, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }
}
