//! Key set cache with TTL and single-flight refresh

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::jwks::{KeySource, PublicKeySet};
use crate::config::KEY_SET_CACHE_TTL_SECS;
use crate::error::Result;
use crate::platform::Clock;

struct CachedEntry {
    keys: PublicKeySet,
    fetched_at: u64,
}

/// Wraps another key source and reuses its result for `ttl_secs`
///
/// The lock is held across the refresh, so concurrent callers that find the
/// entry expired wait for a single fetch instead of issuing their own.
pub struct CachedKeySet {
    source: Arc<dyn KeySource>,
    clock: Arc<dyn Clock>,
    ttl_secs: u64,
    state: Mutex<Option<CachedEntry>>,
}

impl CachedKeySet {
    pub fn new(source: Arc<dyn KeySource>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(source, clock, KEY_SET_CACHE_TTL_SECS)
    }

    pub fn with_ttl(source: Arc<dyn KeySource>, clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        Self {
            source,
            clock,
            ttl_secs,
            state: Mutex::new(None),
        }
    }

    /// Drop the cached set; the next call refetches
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}

#[async_trait]
impl KeySource for CachedKeySet {
    async fn key_set(&self) -> Result<PublicKeySet> {
        let mut state = self.state.lock().await;
        let now = self.clock.now_secs();

        if let Some(entry) = state.as_ref() {
            if now.saturating_sub(entry.fetched_at) < self.ttl_secs {
                return Ok(entry.keys.clone());
            }
        }

        let keys = self.source.key_set().await?;
        tracing::debug!(keys = keys.len(), ttl_secs = self.ttl_secs, "refreshed cached key set");
        *state = Some(CachedEntry {
            keys: keys.clone(),
            fetched_at: now,
        });
        Ok(keys)
    }
}
