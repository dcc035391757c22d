use error_stack::{Report, ResultExt as _};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::{str::FromStr, time::Duration};

use crate::config;

mod error;
mod migrations;

pub use error::*;
pub use migrations::run_pending;

pub type Transaction = sqlx::Transaction<'static, sqlx::Postgres>;
pub type PoolConnection = sqlx::pool::PoolConnection<sqlx::Postgres>;
pub type Connection = sqlx::PgConnection;

/// A lazily connecting pool for one Postgres database.
#[derive(Clone)]
pub struct Pool {
    pool: sqlx::PgPool,
}

impl Pool {
    pub(crate) async fn new(
        global_cfg: &config::Database,
        pool_cfg: &config::DbPoolConfig,
    ) -> Result<Self> {
        let pool = Self::build(global_cfg, pool_cfg)?;

        // The pool connects lazily, so probe it now but tolerate a
        // database that is still coming up.
        match pool.wait_until_healthy().await {
            Ok(..) => {}
            Err(err) if err.is_unhealthy() => {}
            Err(err) => return Err(err),
        }

        Ok(pool)
    }

    fn build(global_cfg: &config::Database, pool_cfg: &config::DbPoolConfig) -> Result<Self> {
        let mut pool_opts = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(global_cfg.timeout_secs.get()))
            .max_connections(pool_cfg.pool_size.get());

        if let Some(min_idle) = pool_cfg.min_idle {
            pool_opts = pool_opts.min_connections(min_idle.get());
        }

        let mut connect_opts =
            PgConnectOptions::from_str(&pool_cfg.url).change_context(Error::InvalidUrl)?;

        if global_cfg.enforce_tls {
            connect_opts = connect_opts.ssl_mode(PgSslMode::Prefer);
        }

        Ok(Self {
            pool: pool_opts.connect_lazy_with(connect_opts),
        })
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.pool.fmt(f)
    }
}

impl Pool {
    #[inline(always)]
    pub fn connections(&self) -> u32 {
        self.pool.size()
    }

    #[inline(always)]
    pub fn is_healthy(&self) -> bool {
        self.connections() > 0
    }

    #[doc(hidden)]
    #[tracing::instrument(name = "db.transaction", skip(self))]
    pub async fn begin(&self) -> Result<Transaction> {
        if let Some(inner) = self.pool.try_begin().await.into_db_error()? {
            Ok(inner)
        } else if !self.is_healthy() {
            Err(Error::UnhealthyPool.into())
        } else {
            let result = self.pool.begin().await;
            result.map_err(|e| Report::new(Error::Internal(e)))
        }
    }

    #[doc(hidden)]
    #[tracing::instrument(name = "db.connect", skip(self))]
    pub async fn get(&self) -> Result<PoolConnection> {
        if let Some(inner) = self.pool.try_acquire() {
            Ok(inner)
        } else if !self.is_healthy() {
            Err(Error::UnhealthyPool.into())
        } else {
            let result = self.pool.acquire().await;
            result.map_err(|e| Report::new(Error::Internal(e)))
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn wait_until_healthy(&self) -> Result<()> {
        match self.pool.acquire().await {
            Ok(..) => Ok(()),
            Err(e) if !self.is_healthy() => Err(e).change_context(Error::UnhealthyPool),
            Err(err) => Err(Report::new(Error::Internal(err))),
        }
    }
}

/// Primary/replica pool pair.
///
/// Reads prefer the replica when one is configured and healthy, writes
/// always go to the primary.
#[derive(Debug, Clone)]
pub struct Database {
    primary: Pool,
    replica: Option<Pool>,
}

impl Database {
    #[tracing::instrument(skip_all, name = "db.connect_pools")]
    pub async fn new(cfg: &config::Database) -> Result<Self> {
        let primary = Pool::new(cfg, &cfg.primary).await?;
        let replica = match cfg.replica.as_ref() {
            Some(replica_cfg) => Some(Pool::new(cfg, replica_cfg).await?),
            None => None,
        };

        Ok(Self { primary, replica })
    }

    /// Builds the pool handles without probing for connectivity.
    #[cfg(test)]
    pub(crate) fn connect_lazy(cfg: &config::Database) -> Result<Self> {
        Ok(Self {
            primary: Pool::build(cfg, &cfg.primary)?,
            replica: None,
        })
    }

    #[tracing::instrument(skip_all, name = "db.read")]
    pub async fn read(&self) -> Result<PoolConnection> {
        if let Some(replica) = self.replica.as_ref() {
            match replica.get().await {
                Ok(conn) => return Ok(conn),
                // an unhealthy replica must not take reads down with it
                Err(err) if err.is_unhealthy() => {}
                Err(err) => return Err(err),
            }
        }

        self.primary.get().await
    }

    #[tracing::instrument(skip_all, name = "db.write")]
    pub async fn write(&self) -> Result<PoolConnection> {
        self.primary.get().await
    }

    #[tracing::instrument(skip_all, name = "db.begin")]
    pub async fn begin(&self) -> Result<Transaction> {
        self.primary.begin().await
    }

    pub async fn wait_until_healthy(&self) -> Result<()> {
        self.primary.wait_until_healthy().await
    }
}
