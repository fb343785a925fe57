use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool, Postgres, QueryBuilder,
};
use tracing::{info, instrument};

use crate::database_ops::load::{conflict_suffix, insert_prefix, CatalogRow, CatalogStore, LoadError};
use crate::util::env::env_flag;

/// Postgres connection pool; constructed once per run and passed by reference.
#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let mut connect_options = PgConnectOptions::from_str(database_url)?;

        if database_url.contains("sslmode=require") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }
        if !env_flag("USE_PREPARED", false) {
            // PgBouncer txn mode safe
            connect_options = connect_options.statement_cache_capacity(0);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(connect_options)
            .await?;
        info!("connected to db");
        Ok(Self { pool })
    }
}

#[async_trait]
impl CatalogStore for Db {
    async fn upsert<R: CatalogRow>(&self, collection: &str, rows: &[R]) -> Result<u64, LoadError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(insert_prefix::<R>(collection));
        qb.push_values(rows, |mut b, row| row.push_binds(&mut b));
        qb.push(conflict_suffix::<R>());
        let written = qb.build().persistent(false).fetch_all(&self.pool).await?;
        Ok(written.len() as u64)
    }
}
