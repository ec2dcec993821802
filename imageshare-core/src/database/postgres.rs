use std::{fmt, time::Duration};

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::{debug, info};

use crate::error::{ImageShareError, Result};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
    pub min_idle: u32,
}

/// Owns the PostgreSQL pool shared by every repository adapter.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
    min_connections: u32,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl PostgresDatabase {
    /// Connect using `connection_string`. Pool bounds come from
    /// `DB_MAX_CONNECTIONS` / `DB_MIN_CONNECTIONS` when set.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let max_connections = env_u32("DB_MAX_CONNECTIONS").unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let min_connections = env_u32("DB_MIN_CONNECTIONS")
            .unwrap_or(DEFAULT_MIN_CONNECTIONS)
            .min(max_connections);

        let options = connection_string
            .trim()
            .parse::<PgConnectOptions>()
            .map_err(|e| {
                ImageShareError::Internal(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .map_err(|e| ImageShareError::Internal(format!("Database connection failed: {e}")))?;

        info!(
            max_connections,
            min_connections, "database pool initialized"
        );

        Ok(Self {
            pool,
            max_connections,
            min_connections,
        })
    }

    /// Wrap an existing pool (used by `#[sqlx::test]`).
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX),
            max_size: self.max_connections,
            min_idle: self.min_connections,
        }
    }

    /// Apply pending embedded migrations.
    pub async fn initialize_schema(&self) -> Result<()> {
        debug!("running database migrations");
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| ImageShareError::Internal(format!("Migration failed: {e}")))?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ImageShareError::Internal(format!("Database ping failed: {e}")))?;
        Ok(())
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
