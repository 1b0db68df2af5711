//! Database Layer
//!
//! `PostgreSQL` connection pool and migrations.

use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Create the `PostgreSQL` connection pool.
///
/// Access checks are a handful of short point queries, so the pool
/// keeps a few warm connections rather than a large ceiling.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .min_connections(4)
        .max_connections(16)
        // Bound the wait on pool exhaustion so requests fail visibly
        .acquire_timeout(Duration::from_secs(3))
        // Recycle connections that sat idle through a quiet period
        .idle_timeout(Duration::from_secs(300))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}
