use std::future::Future;
use std::time::Duration;

use actix_web::rt::time::timeout;
use anyhow::Context;
use sqlx::MySqlPool;
use sqlx::error::ErrorKind;
use sqlx::mysql::MySqlPoolOptions;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PoolConfig;

/// Storage faults, labelled with the query identity (never bound values).
#[derive(Debug, Error)]
pub enum DbError {
    #[error("storage unavailable during `{query}`: {reason}")]
    Unavailable { query: &'static str, reason: String },

    #[error("duplicate key in `{query}`")]
    Duplicate { query: &'static str },

    #[error("constraint violation ({code}) in `{query}`")]
    Constraint { query: &'static str, code: String },

    #[error("query `{query}` failed: {source}")]
    Internal {
        query: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Pooled query execution shared by the credential and attendance stores.
///
/// Cloning is cheap: the pool is reference counted.
#[derive(Clone)]
pub struct Gateway {
    pool: MySqlPool,
    query_timeout: Duration,
}

impl Gateway {
    pub fn new(pool: MySqlPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Runs one statement under the query timeout and classifies its failure.
    /// The connection used by `fut` goes back to the pool whichever way it ends.
    pub async fn run<T, F>(&self, query: &'static str, fut: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(self.query_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let err = classify(query, e);
                warn!(query, error = %err, "Query failed");
                Err(err)
            }
            Err(_) => {
                warn!(query, timeout_ms = self.query_timeout.as_millis() as u64, "Query timed out");
                Err(DbError::Unavailable {
                    query,
                    reason: "query timed out".to_string(),
                })
            }
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Connection pool closed");
    }
}

/// Maps a raw driver error onto the storage fault kinds.
pub fn classify(query: &'static str, err: sqlx::Error) -> DbError {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => DbError::Unavailable {
            query,
            reason: err.to_string(),
        },
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            match db_err.kind() {
                ErrorKind::UniqueViolation => DbError::Duplicate { query },
                ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => DbError::Constraint { query, code },
                _ => DbError::Internal {
                    query,
                    source: sqlx::Error::Database(db_err),
                },
            }
        }
        other => DbError::Internal {
            query,
            source: other,
        },
    }
}

/// Opens the bounded pool once at start-up.
pub async fn init_db(database_url: &str, cfg: &PoolConfig) -> anyhow::Result<Gateway> {
    let pool = MySqlPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(0)
        .acquire_timeout(cfg.acquire_timeout)
        .idle_timeout(Some(cfg.idle_timeout))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    info!(
        max_connections = cfg.max_connections,
        acquire_timeout_ms = cfg.acquire_timeout.as_millis() as u64,
        "Connection pool ready"
    );

    Ok(Gateway::new(pool, cfg.query_timeout))
}

pub async fn run_migrations(gateway: &Gateway) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(gateway.pool())
        .await
        .context("Failed to run migrations")?;
    info!("Migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_faults_are_unavailable() {
        let err = classify("attendance.insert", sqlx::Error::PoolTimedOut);
        assert!(matches!(
            err,
            DbError::Unavailable {
                query: "attendance.insert",
                ..
            }
        ));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(
            classify("users.by_email", sqlx::Error::Io(io)),
            DbError::Unavailable { .. }
        ));
    }

    #[test]
    fn test_unknown_faults_are_internal() {
        let err = classify("attendance.find_owned", sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Internal { .. }));
        assert!(err.to_string().contains("attendance.find_owned"));
    }
}
