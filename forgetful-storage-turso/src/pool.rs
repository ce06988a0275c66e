//! Connection pool for Turso/libSQL database connections.
//!
//! libSQL's `Database` is already a connection factory; this pool adds a
//! concurrency limit via semaphore, connection health validation, and
//! checkout statistics on top of it.

use forgetful_core::error::{Error, Result};
use libsql::{Connection, Database};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

/// Configuration for [`ConnectionPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of concurrent connections.
    pub max_connections: usize,
    /// Maximum time to wait for a connection.
    pub connection_timeout: Duration,
    /// Enable connection health checks on checkout.
    pub enable_health_check: bool,
    /// Health check timeout.
    pub health_check_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connection_timeout: Duration::from_secs(5),
            enable_health_check: true,
            health_check_timeout: Duration::from_secs(2),
        }
    }
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct PoolStatistics {
    pub total_created: usize,
    pub total_health_checks_passed: usize,
    pub total_health_checks_failed: usize,
    pub active_connections: usize,
    pub total_wait_time_ms: u64,
    pub total_checkouts: usize,
    pub avg_wait_time_ms: u64,
}

impl PoolStatistics {
    fn update_averages(&mut self) {
        if self.total_checkouts > 0 {
            self.avg_wait_time_ms = self.total_wait_time_ms / self.total_checkouts as u64;
        }
    }
}

/// A guard that returns its semaphore permit to the pool when dropped.
#[derive(Debug)]
pub struct PooledConnection {
    connection: Option<Connection>,
    _permit: OwnedSemaphorePermit,
    stats: Arc<RwLock<PoolStatistics>>,
}

impl PooledConnection {
    /// Borrow the underlying connection.
    #[must_use]
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Take ownership of the connection, consuming the guard.
    pub fn into_inner(mut self) -> Result<Connection> {
        self.connection
            .take()
            .ok_or_else(|| Error::Internal("connection already taken".to_string()))
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let mut stats = self.stats.write();
        if stats.active_connections > 0 {
            stats.active_connections -= 1;
        }
    }
}

/// Concurrency-limited, health-checked pool of libSQL connections.
pub struct ConnectionPool {
    db: Arc<Database>,
    config: PoolConfig,
    semaphore: Arc<Semaphore>,
    stats: Arc<RwLock<PoolStatistics>>,
}

impl ConnectionPool {
    /// Build a pool over `db`, validating connectivity before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the database can't be reached.
    pub async fn new(db: Arc<Database>, config: PoolConfig) -> Result<Self> {
        info!(max_connections = config.max_connections, "creating connection pool");

        let pool = Self {
            db,
            semaphore: Arc::new(Semaphore::new(config.max_connections)),
            stats: Arc::new(RwLock::new(PoolStatistics::default())),
            config,
        };

        pool.validate_database().await?;
        Ok(pool)
    }

    async fn validate_database(&self) -> Result<()> {
        let conn = self
            .db
            .connect()
            .map_err(|e| Error::Internal(format!("failed to connect to database: {e}")))?;
        conn.query("SELECT 1", ())
            .await
            .map_err(|e| Error::Internal(format!("database validation failed: {e}")))?;
        Ok(())
    }

    async fn create_connection(&self) -> Result<Connection> {
        let conn = self
            .db
            .connect()
            .map_err(|e| Error::Internal(format!("failed to create connection: {e}")))?;
        // SQLite enforces FK constraints (and thus ON DELETE CASCADE) per
        // connection, off by default; every checkout needs this set.
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| Error::Internal(format!("failed to enable foreign keys: {e}")))?;
        self.stats.write().total_created += 1;
        Ok(conn)
    }

    /// Check out a connection, respecting `max_connections` and
    /// `connection_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if no slot frees up in time, or
    /// [`Error::Internal`] if connecting or the health check fails.
    pub async fn get(&self) -> Result<PooledConnection> {
        let start = Instant::now();

        let permit = tokio::time::timeout(self.config.connection_timeout, self.semaphore.clone().acquire_owned())
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| Error::Internal(format!("failed to acquire connection permit: {e}")))?;

        let wait_time = start.elapsed();
        let conn = self.create_connection().await?;

        if self.config.enable_health_check {
            if let Err(e) = self.validate_connection_health(&conn).await {
                self.stats.write().total_health_checks_failed += 1;
                return Err(e);
            }
            self.stats.write().total_health_checks_passed += 1;
        }

        {
            let mut stats = self.stats.write();
            stats.total_checkouts += 1;
            stats.total_wait_time_ms += wait_time.as_millis() as u64;
            stats.active_connections += 1;
            stats.update_averages();
        }

        debug!(?wait_time, active = self.stats.read().active_connections, "connection acquired");

        Ok(PooledConnection {
            connection: Some(conn),
            _permit: permit,
            stats: Arc::clone(&self.stats),
        })
    }

    async fn validate_connection_health(&self, conn: &Connection) -> Result<()> {
        tokio::time::timeout(self.config.health_check_timeout, conn.query("SELECT 1", ()))
            .await
            .map_err(|_| Error::Internal("connection health check timed out".to_string()))?
            .map_err(|e| Error::Internal(format!("connection health check failed: {e}")))?;
        Ok(())
    }

    /// Current pool statistics.
    pub async fn statistics(&self) -> PoolStatistics {
        self.stats.read().clone()
    }

    /// Fraction of `max_connections` currently checked out, `0.0` to `1.0`.
    pub async fn utilization(&self) -> f32 {
        let stats = self.stats.read();
        if self.config.max_connections == 0 {
            return 0.0;
        }
        stats.active_connections as f32 / self.config.max_connections as f32
    }

    /// Graceful shutdown: wait up to 30s for active connections to drain.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutting down connection pool");
        let deadline = Duration::from_secs(30);
        let start = Instant::now();
        while start.elapsed() < deadline {
            if self.stats.read().active_connections == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let remaining = self.stats.read().active_connections;
        if remaining > 0 {
            warn!(remaining, "pool shutdown completed with connections still checked out");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_pool() -> (ConnectionPool, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = libsql::Builder::new_local(dir.path().join("test.db")).build().await.unwrap();
        let pool = ConnectionPool::new(
            Arc::new(db),
            PoolConfig {
                max_connections: 5,
                ..PoolConfig::default()
            },
        )
        .await
        .unwrap();
        (pool, dir)
    }

    #[tokio::test]
    async fn checkout_increments_active_and_release_decrements() {
        let (pool, _dir) = create_test_pool().await;
        {
            let _conn = pool.get().await.unwrap();
            assert_eq!(pool.statistics().await.active_connections, 1);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.statistics().await.active_connections, 0);
    }

    #[tokio::test]
    async fn checkout_beyond_capacity_times_out() {
        let dir = TempDir::new().unwrap();
        let db = libsql::Builder::new_local(dir.path().join("test.db")).build().await.unwrap();
        let pool = ConnectionPool::new(
            Arc::new(db),
            PoolConfig {
                max_connections: 1,
                connection_timeout: Duration::from_millis(100),
                enable_health_check: false,
                ..PoolConfig::default()
            },
        )
        .await
        .unwrap();

        let _held = pool.get().await.unwrap();
        assert!(pool.get().await.is_err());
    }

    #[tokio::test]
    async fn utilization_reflects_checkouts() {
        let (pool, _dir) = create_test_pool().await;
        assert_eq!(pool.utilization().await, 0.0);
        let _conn = pool.get().await.unwrap();
        assert!(pool.utilization().await > 0.0);
    }
}
