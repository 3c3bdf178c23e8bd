// src/db.rs
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::config::Config;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

fn pool_options(config: &Config) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Connect to Postgres, failing fast if the server is unreachable.
pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(config).connect(&config.database_url).await?;
    info!(max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

/// Build a pool that opens connections on first use.
pub fn create_lazy_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    pool_options(config).connect_lazy(&config.database_url)
}
