use async_trait::async_trait;
use serde::Serialize;
use sqlx::{query_builder::Separated, Postgres};
use tracing::{error, info, warn};

use super::dedup::dedup_last_wins;

/// A flat row destined for one catalog table, identified by its external id.
pub trait CatalogRow: Serialize + Send + Sync {
    /// Unique column used as the upsert conflict target.
    const CONFLICT_KEY: &'static str;
    /// Insert column order; `push_binds` must bind in exactly this order.
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> &str;

    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>);
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("database rejected the batch: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Upsert-capable tabular store.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert-or-overwrite `rows` into `collection` keyed by `R::CONFLICT_KEY`.
    /// Returns the number of rows the store reports as written.
    async fn upsert<R: CatalogRow>(&self, collection: &str, rows: &[R]) -> Result<u64, LoadError>;
}

/// `INSERT INTO <collection> (<columns>) ` prefix; values are pushed by the caller.
pub fn insert_prefix<R: CatalogRow>(collection: &str) -> String {
    format!("INSERT INTO {} ({}) ", collection, R::COLUMNS.join(", "))
}

/// Conflict clause overwriting every non-key column and returning the keys written.
pub fn conflict_suffix<R: CatalogRow>() -> String {
    let updates = R::COLUMNS
        .iter()
        .filter(|c| **c != R::CONFLICT_KEY)
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        " ON CONFLICT ({key}) DO UPDATE SET {updates} RETURNING {key}",
        key = R::CONFLICT_KEY
    )
}

/// Load stage: one bulk upsert per run. Never fails the run; a rejected batch
/// is logged and reported as zero rows loaded.
pub async fn load<S, R>(store: &S, collection: &str, rows: Vec<R>) -> u64
where
    S: CatalogStore,
    R: CatalogRow,
{
    if rows.is_empty() {
        warn!(collection, "load: no rows to load");
        return 0;
    }
    // A single INSERT .. ON CONFLICT may not touch the same key twice.
    let submitted = rows.len();
    let rows = dedup_last_wins(rows, |r| r.key().to_string());
    if rows.len() < submitted {
        info!(
            collection,
            duplicates = submitted - rows.len(),
            "load: collapsed rows sharing an external id"
        );
    }

    info!(collection, count = rows.len(), "load: upserting batch");
    match store.upsert(collection, &rows).await {
        Ok(written) => {
            info!(collection, written, "load: batch written");
            written
        }
        Err(err) => {
            error!(collection, error = %err, "load: failed to write batch");
            0
        }
    }
}
