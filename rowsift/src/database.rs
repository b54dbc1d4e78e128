//! Database connection pool management

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    config::DatabaseConfig,
    error::{Error, Result},
};

/// Create a PostgreSQL connection pool, retrying failed connects
///
/// Makes at most `max_retries + 1` attempts. The wait before retry `n` is
/// [`DatabaseConfig::retry_delay`]`(n)`, doubling from `retry_delay_secs`.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let url = sanitize_connection_url(&config.url);
    let attempts = config.max_retries.saturating_add(1);
    let mut attempt = 1;

    loop {
        let err = match try_create_pool(config).await {
            Ok(pool) => {
                tracing::info!(
                    url = %url,
                    attempt,
                    max_connections = config.max_connections,
                    min_connections = config.min_connections,
                    "Database pool ready"
                );
                return Ok(pool);
            }
            Err(err) => err,
        };

        if attempt >= attempts {
            tracing::error!(url = %url, attempts, error = %err, "Giving up on database");
            return Err(err);
        }

        let delay = config.retry_delay(attempt);
        tracing::warn!(
            url = %url,
            attempt,
            attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Database connect failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Attempt to create a database pool (single try)
async fn try_create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connection_timeout())
        .connect(&config.url)
        .await
        .map_err(|e| {
            Error::Connection(format!(
                "{} at '{}' ({})",
                categorize_db_error(&e),
                sanitize_connection_url(&config.url),
                e
            ))
        })
}

/// Sanitize connection URL for safe logging (remove password)
fn sanitize_connection_url(url: &str) -> String {
    if let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) {
        let credentials_start = scheme_end + 3;
        if credentials_start < at_pos {
            if let Some(colon) = url[credentials_start..at_pos].find(':') {
                let username = &url[credentials_start..credentials_start + colon];
                return format!("{}{}:***{}", &url[..credentials_start], username, &url[at_pos..]);
            }
        }
    }
    url.to_string()
}

/// Categorize database error for better user guidance
fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    use sqlx::Error;
    match err {
        Error::Configuration(_) => "Configuration error",
        Error::Database(_) => "Database rejected the connection",
        Error::Io(_) => "Network I/O error - check connectivity",
        Error::Tls(_) => "TLS/SSL error - check certificate configuration",
        Error::PoolTimedOut => "Connection pool timeout - database may be overloaded",
        Error::PoolClosed => "Connection pool closed",
        Error::WorkerCrashed => "Database worker crashed",
        _ => "Connection error",
    }
}
