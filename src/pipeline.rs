use chrono::{DateTime, Utc};
use log::{info, warn};
use thiserror::Error;

use crate::cache::{CacheError, FileCache};
use crate::catalog::{CatalogCache, SpaceTrackClient};
use crate::config::{Config, ConfigError, Credentials};
use crate::filter::{filter_catalog, ExclusionLog};
use crate::predict::{find_culminations, Observer, PassEvent};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

pub fn pass_cache(config: &Config) -> FileCache<PassEvent> {
    FileCache::new(config.passes.cache_file.clone(), config.passes.max_age)
}

/// Serve the pass envelope while fresh; recompute the whole upstream pipeline
/// when it is stale, absent, or a refresh is forced.
pub fn get_events(
    config: &Config,
    observer: &Observer,
    now: DateTime<Utc>,
    force: bool,
) -> Result<Vec<PassEvent>, PipelineError> {
    if !force {
        if let Some(events) = pass_cache(config).load_fresh(now) {
            info!("using cached pass events ({} entries)", events.len());
            return Ok(events);
        }
    }
    refresh_passes(config, observer, now, force)
}

/// The full recompute: catalog (cached or refetched) → relevance filter →
/// culmination prediction per entry → stable sort → atomic persist. Transient
/// per-object failures are logged and skipped; an authentication failure
/// aborts the cycle and is retried at the next refresh.
pub fn refresh_passes(
    config: &Config,
    observer: &Observer,
    now: DateTime<Utc>,
    force_fetch: bool,
) -> Result<Vec<PassEvent>, PipelineError> {
    let credentials = Credentials::from_file(&config.catalog.credentials_file)?;
    let client = SpaceTrackClient::new(&config.catalog, credentials)?;
    let catalog_cache = CatalogCache::new(FileCache::new(
        config.catalog.cache_file.clone(),
        config.catalog.max_age,
    ));

    let catalog = if force_fetch {
        catalog_cache.refetch(&client, now)?
    } else {
        catalog_cache.get_catalog(&client, now)?
    };

    let mut exclusions = ExclusionLog::open(&config.passes.exclusion_log);
    let filtered = filter_catalog(
        &catalog,
        observer,
        &config.prediction.whitelist,
        now,
        &mut exclusions,
    );

    let mut events = Vec::new();
    for entry in &filtered {
        match find_culminations(
            observer,
            &entry.elements,
            &entry.constants,
            &entry.object_id,
            &entry.object_name,
            entry.rcs,
            now,
            config.prediction.horizon,
            config.prediction.radius_km,
            config.prediction.retain,
        ) {
            Ok(found) => events.extend(found),
            Err(e) => warn!("skipping {}: {}", entry.object_id, e),
        }
    }

    sort_events(&mut events);
    pass_cache(config).store(&events, now)?;
    info!(
        "pass cache updated: {} events from {} relevant objects",
        events.len(),
        filtered.len()
    );
    Ok(events)
}

/// Total order by culmination time; the sort is stable so ties keep the input
/// order rather than leaning on object-id ordering.
pub fn sort_events(events: &mut [PassEvent]) {
    events.sort_by_key(|e| e.culmination_time);
}
