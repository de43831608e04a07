//! Cached trigger lookups with time-based refresh.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use thiserror::Error;

use kotik_types::Trigger;

use crate::map::build_trigger_map;
use crate::source::{SourceError, TriggerSource};

#[derive(Debug, Error)]
pub enum TriggerStoreError {
    /// The source failed and there is no previously loaded map to fall back
    /// to. With a populated cache a failed refresh serves stale data instead.
    #[error("trigger source unavailable and no cached map exists")]
    SourceUnavailable(#[source] SourceError),
}

struct CacheEntry {
    map: HashMap<Trigger, Vec<String>>,
    loaded_at: Instant,
}

/// Trigger map cache over a [`TriggerSource`].
///
/// A read refreshes the map when none has been loaded yet or the last load is
/// older than `lifetime`. Refreshes are serialized behind one async lock, so
/// concurrent expiry collapses into a single fetch.
pub struct TriggerStore<S> {
    source: S,
    lifetime: Duration,
    cache: tokio::sync::Mutex<Option<CacheEntry>>,
}

impl<S: TriggerSource> TriggerStore<S> {
    pub fn new(source: S, lifetime: Duration) -> Self {
        Self {
            source,
            lifetime,
            cache: tokio::sync::Mutex::new(None),
        }
    }

    /// Look up the candidate responses for `key`.
    ///
    /// The key is normalized exactly like map keys are at build time; a key
    /// that normalizes to empty is a clean miss (empty keys cannot exist in
    /// the map). Returns an error only when no map has ever been loaded and
    /// the source is down.
    pub async fn resolve(&self, key: &str) -> Result<Option<Vec<String>>, TriggerStoreError> {
        let Ok(trigger) = Trigger::new(key) else {
            return Ok(None);
        };

        let mut cache = self.cache.lock().await;
        let expired = cache
            .as_ref()
            .is_none_or(|entry| entry.loaded_at.elapsed() > self.lifetime);

        if expired {
            match self.source.fetch().await {
                Ok(rows) => {
                    let map = build_trigger_map(&rows);
                    tracing::info!(triggers = map.len(), "trigger map refreshed");
                    *cache = Some(CacheEntry {
                        map,
                        loaded_at: Instant::now(),
                    });
                }
                Err(err) => match cache.as_ref() {
                    Some(entry) => {
                        tracing::warn!(
                            error = %err,
                            age_secs = entry.loaded_at.elapsed().as_secs(),
                            "trigger refresh failed, serving stale map"
                        );
                    }
                    None => return Err(TriggerStoreError::SourceUnavailable(err)),
                },
            }
        }

        Ok(cache
            .as_ref()
            .and_then(|entry| entry.map.get(&trigger).cloned()))
    }
}
