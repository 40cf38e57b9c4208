use std::marker::PhantomData;
use std::sync::Arc;

use log::warn;

use crate::error::StoreError;
use crate::models::{Entity, RecordId};
use crate::store::TableStore;

/// Typed access to the table behind `E`. Holds no state of its own, so clones
/// are cheap and can be moved into background tasks.
pub struct Repository<E> {
    tables: Arc<dyn TableStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            tables: self.tables.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(tables: Arc<dyn TableStore>) -> Self {
        Self {
            tables,
            _entity: PhantomData,
        }
    }

    /// All records in the entity's list order. Rows that do not decode are
    /// logged and left out; only a failed request fails the list.
    pub async fn list(&self) -> Result<Vec<E>, StoreError> {
        let rows = self.tables.select_all(E::TABLE, E::ORDER).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!("Skipping undecodable row in {}: {err}", E::TABLE);
                    None
                }
            })
            .collect())
    }

    pub async fn by_slug(&self, slug: &str) -> Result<E, StoreError> {
        let row = self.tables.select_one(E::TABLE, "slug", slug).await?;
        Ok(serde_json::from_value(row)?)
    }

    /// Write the whole record in one request. Records without an id are
    /// inserted; records with one replace the stored row.
    pub async fn upsert(&self, record: &E) -> Result<E, StoreError> {
        let row = serde_json::to_value(record)?;
        let stored = self.tables.upsert(E::TABLE, row).await?;
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.tables.delete(E::TABLE, id).await
    }
}
