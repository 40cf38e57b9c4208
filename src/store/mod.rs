//! Access to the table store and blob store that hold every record and image.
//! The rest of the crate only sees the two traits below; which backend sits
//! behind them is decided once, at startup, from the configuration.

mod local;
mod rest;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;

use crate::config::{BackendConfig, Config};
use crate::error::StoreError;
use crate::models::RecordId;

pub use local::LocalStore;
pub use rest::RestStore;

/// One table row as JSON. Typed conversion happens in the data layer.
pub type Row = serde_json::Value;

/// Sort applied to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

impl OrderBy {
    pub const fn ascending(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn descending(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Row-level operations on named tables. Each call is one independent request;
/// nothing here spans more than a single row write.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Every row of `table`, sorted by `order`.
    async fn select_all(&self, table: &str, order: OrderBy) -> Result<Vec<Row>, StoreError>;

    /// The single row whose `column` equals `value`. Zero matches is
    /// [`StoreError::NotFound`], more than one is [`StoreError::MultipleRows`].
    async fn select_one(&self, table: &str, column: &str, value: &str)
        -> Result<Row, StoreError>;

    /// Insert `row`, or replace the stored row with the same `id`. Returns the
    /// row as stored, including backend-assigned columns.
    async fn upsert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// Remove the row with primary key `id`. Deleting a missing id succeeds.
    async fn delete(&self, table: &str, id: &RecordId) -> Result<(), StoreError>;
}

/// Bucketed binary storage for uploaded images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` in `bucket`. Existing keys are not replaced.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Publicly reachable URL for `key`. Computed locally; does not check the
    /// object exists.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// The pair of store handles the application runs against.
#[derive(Clone)]
pub struct Backend {
    pub tables: Arc<dyn TableStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Backend {
    /// Build the backend selected by `config`. A remote URL gets the HTTP
    /// client; otherwise records live in the local SQLite file.
    pub fn connect(config: &Config) -> Result<Self> {
        match &config.backend {
            BackendConfig::Remote { url, api_key } => {
                info!("Using hosted backend at {url}");
                let store = RestStore::new(url, api_key, config.request_timeout)
                    .context("failed to build HTTP client")?;
                Ok(Self::from_store(Arc::new(store)))
            }
            BackendConfig::Local {
                database,
                blob_dir,
            } => {
                info!("Using local store at {}", database.display());
                let store =
                    LocalStore::open(database, blob_dir).context("failed to open local store")?;
                Ok(Self::from_store(Arc::new(store)))
            }
        }
    }

    /// Wrap one value that implements both traits, as both backends do.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TableStore + BlobStore + 'static,
    {
        Self {
            tables: store.clone(),
            blobs: store,
        }
    }
}
