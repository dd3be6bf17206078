use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::filter::Filter;

use super::client::DatabaseError;
use super::query_builder::JsonQuery;
use super::session::RequestClaims;

/// Row source behind every client handle.
///
/// Implementations must evaluate the query under the given request claims;
/// the Postgres backend does so by setting them transaction-locally, which is
/// what the database's row-level security policies read.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn select(&self, claims: &RequestClaims, filter: &Filter) -> Result<Vec<Value>, DatabaseError>;

    async fn ping(&self, claims: &RequestClaims) -> Result<(), DatabaseError>;
}

pub struct PgBackend {
    pool: PgPool,
    query_logging: bool,
    slow_query_threshold: Option<Duration>,
}

impl PgBackend {
    /// Pool connections are opened on first use, so startup never blocks on
    /// the network.
    pub fn connect_lazy(url: &str, config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(url)?;

        Ok(Self {
            pool,
            query_logging: config.enable_query_logging,
            slow_query_threshold: config
                .enable_slow_query_warning
                .then(|| Duration::from_millis(config.slow_query_threshold_ms)),
        })
    }

    async fn begin_as(&self, claims: &RequestClaims) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('request.jwt.claims', $1, true), set_config('role', $2, true)")
            .bind(claims.claims.to_string())
            .bind(&claims.role)
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

#[async_trait]
impl Backend for PgBackend {
    async fn select(&self, claims: &RequestClaims, filter: &Filter) -> Result<Vec<Value>, DatabaseError> {
        let query = JsonQuery::from_filter(filter)?;
        if self.query_logging {
            debug!(sql = %query.sql, params = ?query.params, role = %claims.role, "Executing query");
        }

        let started = Instant::now();
        let mut tx = self.begin_as(claims).await?;
        let rows = query.bind().fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let elapsed = started.elapsed();
        if let Some(threshold) = self.slow_query_threshold {
            if elapsed > threshold {
                warn!(
                    table = filter.table_name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Slow query"
                );
            }
        }

        rows.iter()
            .map(|row| {
                row.try_get::<Value, _>("row").map_err(|e| DatabaseError::Decode {
                    table: filter.table_name().to_string(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    async fn ping(&self, claims: &RequestClaims) -> Result<(), DatabaseError> {
        let mut tx = self.begin_as(claims).await?;
        sqlx::query("SELECT 1").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
