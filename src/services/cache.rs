//! TTL response caching for backend GET endpoints.
//!
//! Call sites go through [`RequestCache::fetch_cached`] instead of hitting
//! the backend directly. Only paths matching the cacheable allow-list are
//! memoized; everything else always performs a real request.
//!
//! # Semantics
//!
//! - Two calls to an allow-listed path within the TTL window perform exactly
//!   one backend request.
//! - After the TTL expires, the next call refetches and refreshes the entry.
//! - A failed fetch propagates the error unchanged and never touches the
//!   stored entry; value fallback for flaky sensors lives in the stabilizer,
//!   not here.

use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::backend::Backend;
use crate::error::AppResult;

/// Backend path fragments whose responses are safe to memoize.
/// These endpoints change slowly relative to the poll cadence.
const CACHEABLE_PATHS: &[&str] = &[
    "/datos_kpi",
    "/registros_15min",
    "/obtener_materiales_base_json",
    "/parametros_globales",
    "/stock",
    "/historico_diario",
    "/plan_mensual",
    "/plan_semanal",
    "/gases_biodigestores",
    "/balance_volumetrico",
];

/// A memoized response. Overwritten wholesale on every successful fetch,
/// so `expires_at >= fetched_at` always holds.
#[derive(Clone)]
pub struct CacheEntry {
    pub value: Arc<Value>,
    pub fetched_at: Instant,
    pub expires_at: Instant,
}

/// Cache counters exposed over the gateway API.
#[derive(Debug, Clone, Copy, Serialize, utoipa::ToSchema)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

pub struct RequestCache<B> {
    backend: Arc<B>,
    entries: Cache<String, CacheEntry>,
    cacheable: Vec<String>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<B: Backend> RequestCache<B> {
    #[must_use]
    pub fn new(backend: Arc<B>, max_entries: u64) -> Self {
        Self::with_allow_list(
            backend,
            max_entries,
            CACHEABLE_PATHS.iter().map(ToString::to_string).collect(),
        )
    }

    #[must_use]
    pub fn with_allow_list(backend: Arc<B>, max_entries: u64, cacheable: Vec<String>) -> Self {
        let entries = Cache::builder().max_capacity(max_entries).build();

        Self {
            backend,
            entries,
            cacheable,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Whether a path matches the cacheable allow-list (substring match).
    #[must_use]
    pub fn is_cacheable(&self, path: &str) -> bool {
        self.cacheable.iter().any(|fragment| path.contains(fragment.as_str()))
    }

    /// Fetch a JSON endpoint through the cache.
    ///
    /// Non-cacheable paths bypass the cache entirely. For cacheable paths a
    /// live entry is served without network I/O; otherwise the backend is hit
    /// and the entry replaced with `expires_at = now + ttl`.
    ///
    /// # Errors
    ///
    /// Propagates any backend error unchanged. The previous entry, expired or
    /// not, stays in place for the next attempt to overwrite.
    pub async fn fetch_cached(&self, path: &str, ttl: Duration) -> AppResult<Arc<Value>> {
        if !self.is_cacheable(path) {
            let value = self.backend.get_json(path).await?;
            return Ok(Arc::new(value));
        }

        let now = Instant::now();

        if let Some(entry) = self.entries.get(path).await {
            if now < entry.expires_at {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(path = %path, "cache_hit");
                return Ok(entry.value);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(path = %path, ttl_secs = ttl.as_secs(), "cache_miss");

        let value = Arc::new(self.backend.get_json(path).await?);
        self.entries
            .insert(
                path.to_string(),
                CacheEntry {
                    value: value.clone(),
                    fetched_at: now,
                    expires_at: now + ttl,
                },
            )
            .await;

        Ok(value)
    }

    /// Drop all cache entries.
    pub async fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
        tracing::debug!("cache_cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks().await;
        CacheStats {
            entries: self.entries.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::SensorReading;
    use crate::error::AppError;

    struct NullBackend;

    impl Backend for NullBackend {
        async fn get_json(&self, _path: &str) -> AppResult<Value> {
            Err(AppError::Internal("not used".to_string()))
        }

        async fn get_reading(&self, _path: &str) -> AppResult<SensorReading> {
            Err(AppError::Internal("not used".to_string()))
        }

        async fn probe(&self, _path: &str) -> AppResult<()> {
            Err(AppError::Internal("not used".to_string()))
        }
    }

    #[tokio::test]
    async fn allow_list_is_substring_match() {
        let cache = RequestCache::new(Arc::new(NullBackend), 16);

        assert!(cache.is_cacheable("/datos_kpi"));
        assert!(cache.is_cacheable("/stock?planta=1"));
        assert!(cache.is_cacheable("/api/v2/historico_diario"));
        assert!(!cache.is_cacheable("/040pt01"));
        assert!(!cache.is_cacheable("/ping"));
    }
}
