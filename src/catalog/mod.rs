mod client;
mod types;

pub use client::{CatalogError, CatalogSource, SpaceTrackClient};
pub use types::{CatalogEntry, ObjectType, RcsClass};

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::cache::FileCache;

/// The catalog-level envelope: serves the cached payload while it is fresh,
/// refetches from the source once it goes stale. A failed query degrades to an
/// empty catalog rather than an error; downstream must treat an empty catalog
/// as a valid, if degenerate, state. A rejected login is different: no data
/// can be produced this cycle, so it propagates and the caller skips the
/// cycle without touching any persisted state.
pub struct CatalogCache {
    cache: FileCache<CatalogEntry>,
}

impl CatalogCache {
    pub fn new(cache: FileCache<CatalogEntry>) -> Self {
        Self { cache }
    }

    pub fn get_catalog<S: CatalogSource>(
        &self,
        source: &S,
        now: DateTime<Utc>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        if let Some(cached) = self.cache.load_fresh(now) {
            info!("using cached catalog ({} entries)", cached.len());
            return Ok(cached);
        }
        self.refetch(source, now)
    }

    /// Skip the freshness check and always hit the source.
    pub fn refetch<S: CatalogSource>(
        &self,
        source: &S,
        now: DateTime<Utc>,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        match source.fetch() {
            Ok(entries) => {
                if let Err(e) = self.cache.store(&entries, now) {
                    warn!("failed to persist catalog cache: {}", e);
                }
                Ok(entries)
            }
            Err(e @ CatalogError::LoginFailed(_)) => {
                warn!("catalog login rejected, skipping this cycle: {}", e);
                Err(e)
            }
            Err(e) => {
                warn!("catalog fetch failed, treating as empty this cycle: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::cell::Cell;

    enum Outcome {
        Entries,
        QueryFailure,
        LoginRejection,
    }

    struct CountingSource {
        fetches: Cell<usize>,
        outcome: Outcome,
    }

    impl CountingSource {
        fn new(outcome: Outcome) -> Self {
            Self {
                fetches: Cell::new(0),
                outcome,
            }
        }
    }

    impl CatalogSource for CountingSource {
        fn fetch(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
            self.fetches.set(self.fetches.get() + 1);
            match self.outcome {
                Outcome::QueryFailure => Err(CatalogError::QueryFailed(
                    reqwest::StatusCode::SERVICE_UNAVAILABLE,
                )),
                Outcome::LoginRejection => Err(CatalogError::LoginFailed(
                    reqwest::StatusCode::UNAUTHORIZED,
                )),
                Outcome::Entries => Ok(vec![serde_json::from_str(
                    r#"{"OBJECT_ID": "1999-025A", "OBJECT_TYPE": "DEBRIS"}"#,
                )
                .unwrap()]),
            }
        }
    }

    fn cache_in(dir: &std::path::Path) -> CatalogCache {
        CatalogCache::new(FileCache::new(dir.join("data.json"), Duration::hours(24)))
    }

    #[test]
    fn fresh_cache_serves_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = cache_in(dir.path());
        let source = CountingSource::new(Outcome::Entries);
        let now = Utc::now();

        let first = catalog.get_catalog(&source, now).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(source.fetches.get(), 1);

        let second = catalog.get_catalog(&source, now + Duration::hours(1)).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(source.fetches.get(), 1, "fresh cache must not refetch");
    }

    #[test]
    fn stale_cache_triggers_exactly_one_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = cache_in(dir.path());
        let source = CountingSource::new(Outcome::Entries);
        let now = Utc::now();

        catalog.get_catalog(&source, now).unwrap();
        catalog.get_catalog(&source, now + Duration::hours(25)).unwrap();
        assert_eq!(source.fetches.get(), 2);
    }

    #[test]
    fn query_failure_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = cache_in(dir.path());
        let source = CountingSource::new(Outcome::QueryFailure);

        let entries = catalog.get_catalog(&source, Utc::now()).unwrap();
        assert!(entries.is_empty());
        assert!(!catalog.cache.exists(), "failed fetch must not be cached");
    }

    #[test]
    fn login_rejection_propagates_instead_of_degrading() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = cache_in(dir.path());
        let source = CountingSource::new(Outcome::LoginRejection);

        let result = catalog.get_catalog(&source, Utc::now());
        assert!(matches!(result, Err(CatalogError::LoginFailed(_))));
        assert!(!catalog.cache.exists(), "rejected login must not be cached");
    }
}
