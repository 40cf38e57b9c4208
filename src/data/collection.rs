use log::{debug, warn};

use super::repository::Repository;
use crate::error::StoreError;
use crate::models::Entity;

/// Identifies one list request. Tickets increase monotonically per collection;
/// only the response to the newest ticket is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// In-memory copy of one table for a screen to render from.
///
/// The backend stays the source of truth. After any successful write the
/// owner calls [`Collection::invalidate`], and whoever drives requests checks
/// [`Collection::needs_fetch`] and issues a fresh list request. A new
/// collection starts out stale so the first driver pass loads it.
///
/// Failures never escape as errors: they are stored as a display string in
/// [`Collection::error`] (list requests) or [`Collection::lookup_error`]
/// (single-record lookups).
#[derive(Debug)]
pub struct Collection<E> {
    items: Vec<E>,
    error: Option<String>,
    lookup_error: Option<String>,
    in_flight: usize,
    latest: u64,
    loaded: bool,
    stale: bool,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
            lookup_error: None,
            in_flight: 0,
            latest: 0,
            loaded: false,
            stale: true,
        }
    }
}

impl<E: Entity> Collection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    /// True while any request issued through this collection is outstanding.
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn lookup_error(&self) -> Option<&str> {
        self.lookup_error.as_deref()
    }

    /// Whether at least one list request has succeeded.
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Mark the cached list as out of date after a write.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn needs_fetch(&self) -> bool {
        self.stale
    }

    /// Record that a list request is about to be sent.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.in_flight += 1;
        self.latest += 1;
        self.stale = false;
        FetchTicket(self.latest)
    }

    /// Apply the outcome of the request identified by `ticket`.
    ///
    /// A success replaces the list wholesale. A failure records the message
    /// and keeps whatever an earlier success loaded. Responses to superseded
    /// tickets only release the loading flag. Returns whether the outcome was
    /// applied.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, outcome: Result<Vec<E>, StoreError>) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        if ticket.0 != self.latest {
            debug!(
                "Dropping stale {} list response {} (latest is {})",
                E::TABLE,
                ticket.0,
                self.latest
            );
            return false;
        }

        match outcome {
            Ok(items) => {
                debug!("Loaded {} {} rows", items.len(), E::TABLE);
                self.items = items;
                self.error = None;
                self.loaded = true;
            }
            Err(err) => {
                warn!("Error fetching {}: {err}", E::TABLE);
                self.error = Some(err.to_string());
                if !self.loaded {
                    self.items.clear();
                }
            }
        }
        true
    }

    /// Reload the whole list.
    pub async fn fetch_all(&mut self, repo: &Repository<E>) {
        let ticket = self.begin_fetch();
        let outcome = repo.list().await;
        self.finish_fetch(ticket, outcome);
    }

    /// Look up one record by slug without touching the cached list. Returns
    /// `None` when nothing matches or the request fails.
    pub async fn fetch_by_slug(&mut self, repo: &Repository<E>, slug: &str) -> Option<E> {
        self.in_flight += 1;
        let outcome = repo.by_slug(slug).await;
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            Ok(record) => {
                self.lookup_error = None;
                Some(record)
            }
            Err(err) => {
                if err.is_not_found() {
                    debug!("No {} with slug {slug:?}", E::TABLE);
                } else {
                    warn!("Error fetching {} {slug:?}: {err}", E::TABLE);
                }
                self.lookup_error = Some(err.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::models::Bird;
    use crate::store::LocalStore;

    fn bird(name: &str) -> Bird {
        Bird {
            english_name: name.to_string(),
            slug: crate::slug::slugify(name),
            ..Bird::default()
        }
    }

    fn rejected() -> StoreError {
        StoreError::Rejected {
            status: 503,
            message: "backend down".to_string(),
        }
    }

    #[test]
    fn starts_stale_and_idle() {
        let collection: Collection<Bird> = Collection::new();
        assert!(collection.needs_fetch());
        assert!(!collection.loading());
        assert!(collection.items().is_empty());
    }

    #[test]
    fn loading_tracks_outstanding_requests() {
        let mut collection: Collection<Bird> = Collection::new();
        let first = collection.begin_fetch();
        assert!(collection.loading());
        assert!(!collection.needs_fetch());

        collection.finish_fetch(first, Ok(vec![bird("Kea")]));
        assert!(!collection.loading());
        assert!(collection.loaded());
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut collection: Collection<Bird> = Collection::new();
        let older = collection.begin_fetch();
        let newer = collection.begin_fetch();

        assert!(collection.finish_fetch(newer, Ok(vec![bird("Kea"), bird("Kakapo")])));
        assert!(collection.loading());
        assert!(!collection.finish_fetch(older, Ok(vec![bird("Moa")])));

        let names: Vec<_> = collection.items().iter().map(|b| b.english_name.as_str()).collect();
        assert_eq!(names, ["Kea", "Kakapo"]);
        assert!(!collection.loading());
    }

    #[test]
    fn failure_keeps_previous_items() {
        let mut collection: Collection<Bird> = Collection::new();
        let ticket = collection.begin_fetch();
        collection.finish_fetch(ticket, Ok(vec![bird("Kea")]));

        let ticket = collection.begin_fetch();
        collection.finish_fetch(ticket, Err(rejected()));

        assert_eq!(collection.items().len(), 1);
        assert_eq!(collection.error(), Some("backend down (status 503)"));
    }

    #[test]
    fn failure_before_any_success_leaves_list_empty() {
        let mut collection: Collection<Bird> = Collection::new();
        let ticket = collection.begin_fetch();
        collection.finish_fetch(ticket, Err(rejected()));

        assert!(collection.items().is_empty());
        assert!(collection.error().is_some());
        assert!(!collection.loaded());
    }

    #[test]
    fn invalidate_requests_another_fetch() {
        let mut collection: Collection<Bird> = Collection::new();
        let ticket = collection.begin_fetch();
        collection.finish_fetch(ticket, Ok(Vec::new()));
        assert!(!collection.needs_fetch());

        collection.invalidate();
        assert!(collection.needs_fetch());
    }

    #[tokio::test]
    async fn fetch_by_slug_returns_none_for_unknown_slug() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::in_memory(dir.path()).unwrap());
        let repo: Repository<Bird> = Repository::new(store);
        repo.upsert(&bird("Bald Eagle")).await.unwrap();

        let mut collection = Collection::new();
        collection.fetch_all(&repo).await;
        assert_eq!(collection.items().len(), 1);

        assert!(collection.fetch_by_slug(&repo, "dodo").await.is_none());
        assert!(collection.lookup_error().is_some());
        assert!(!collection.loading());
        assert_eq!(collection.items().len(), 1);

        let found = collection.fetch_by_slug(&repo, "bald-eagle").await;
        assert_eq!(found.map(|b| b.english_name), Some("Bald Eagle".to_string()));
        assert!(collection.lookup_error().is_none());
    }
}
