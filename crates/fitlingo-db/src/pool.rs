//! Connection pools, embedded migrations and first-run database creation.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/fitlingo-db/migrations/`.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Request handlers run a few short statements each.
const MAX_CONNECTIONS: u32 = 10;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to database at {url}"))
}

/// Pool for the configured database.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    connect(&config.database_url, MAX_CONNECTIONS).await
}

/// Single-connection pool on the server's `postgres` database, for
/// statements that cannot run inside the target database.
pub async fn connect_maintenance(config: &DbConfig) -> Result<PgPool> {
    connect(&config.maintenance_url(), 1).await
}

/// Bring the `users` schema up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!(migrations = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}

/// Create the configured database when it is missing.
///
/// Returns `true` when the database was created by this call.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let (Some(name), Some(quoted)) = (config.database_name(), config.quoted_database_name())
    else {
        anyhow::bail!(
            "no database name in connection URL {}",
            config.database_url
        );
    };

    let maint_pool = connect_maintenance(config).await?;
    let created = create_if_missing(&maint_pool, name, &quoted).await;
    maint_pool.close().await;

    let created = created?;
    if created {
        info!(db = name, "database created");
    } else {
        debug!(db = name, "database already exists");
    }
    Ok(created)
}

async fn create_if_missing(maint_pool: &PgPool, name: &str, quoted: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(name)
            .fetch_one(maint_pool)
            .await
            .context("failed to query pg_database")?;
    if exists {
        return Ok(false);
    }

    maint_pool
        .execute(format!("CREATE DATABASE {quoted}").as_str())
        .await
        .with_context(|| format!("failed to create database {name}"))?;
    Ok(true)
}
