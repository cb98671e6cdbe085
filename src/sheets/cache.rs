// src/sheets/cache.rs
//
// Process-wide memo of sheet rows keyed by (sheet id, tab). Entries expire
// lazily: age is checked on the next lookup and a stale entry is replaced
// wholesale. Two concurrent misses on the same key may both fetch; the last
// write wins.

use std::{collections::HashMap, sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{parse::filter_by_month, source::RowSource};
use crate::{
    error::AppError,
    models::{FetchedRows, Record, RowQuery},
};

const DEFAULT_TAB: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    sheet_id: String,
    gid: String,
}

impl CacheKey {
    fn new(sheet_id: &str, gid: Option<&str>) -> Self {
        Self {
            sheet_id: sheet_id.to_string(),
            gid: gid.filter(|g| !g.is_empty()).unwrap_or(DEFAULT_TAB).to_string(),
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    records: Arc<Vec<Record>>,
    fetched_at: DateTime<Utc>,
}

pub struct RowCache {
    source: Arc<dyn RowSource>,
    sheet_id: Option<String>,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl RowCache {
    pub fn new(source: Arc<dyn RowSource>, sheet_id: Option<String>, ttl: Duration) -> Self {
        Self {
            source,
            sheet_id,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Loads the default tab, giving up after `timeout`. Returns the row count
    /// when the cache was filled; failures are logged and never fatal.
    pub async fn warm_up(&self, timeout: StdDuration) -> Option<usize> {
        match tokio::time::timeout(timeout, self.resolve(&RowQuery::default())).await {
            Ok(Ok(fetched)) => {
                info!(rows = fetched.records.len(), "cache warmed");
                Some(fetched.records.len())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "cache warm-up failed");
                None
            }
            Err(_) => {
                warn!(?timeout, "cache warm-up timed out");
                None
            }
        }
    }

    /// Rows for the requested tab of the configured sheet, from cache while
    /// younger than the TTL. The month/year filter is applied to the cached
    /// set, never stored.
    pub async fn resolve(&self, query: &RowQuery) -> Result<FetchedRows, AppError> {
        let sheet_id = self
            .sheet_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(AppError::MissingSheetId)?;
        let gid = query.gid.as_deref();
        let key = CacheKey::new(sheet_id, gid);
        let now = Utc::now();

        let hit = {
            let entries = self.entries.read().await;
            entries
                .get(&key)
                .filter(|e| now - e.fetched_at < self.ttl)
                .cloned()
        };

        let (entry, from_cache) = match hit {
            Some(entry) => {
                debug!(sheet_id, gid = %key.gid, "using cached rows");
                (entry, true)
            }
            None => {
                info!(sheet_id, gid = %key.gid, "cache miss, fetching sheet");
                let records = self.source.fetch_rows(sheet_id, gid).await?;
                let entry = CacheEntry {
                    records: Arc::new(records),
                    fetched_at: now,
                };
                self.entries.write().await.insert(key, entry.clone());
                (entry, false)
            }
        };

        let records = match filter_by_month(&entry.records, query.month, query.year) {
            Some(filtered) => Arc::new(filtered),
            None => entry.records,
        };

        Ok(FetchedRows {
            records,
            fetched_at: entry.fetched_at,
            from_cache,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// In-memory `RowSource` that counts how often it was asked.
    pub(crate) struct FakeSource {
        pub rows: Vec<Record>,
        pub calls: AtomicUsize,
        pub fail_with: Option<u16>,
        pub delay: Option<StdDuration>,
    }

    impl FakeSource {
        pub(crate) fn new(rows: Vec<Record>) -> Self {
            Self { rows, calls: AtomicUsize::new(0), fail_with: None, delay: None }
        }

        pub(crate) fn slow(rows: Vec<Record>, delay: StdDuration) -> Self {
            Self { delay: Some(delay), ..Self::new(rows) }
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self { fail_with: Some(status), ..Self::new(Vec::new()) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RowSource for FakeSource {
        async fn fetch_rows(&self, _sheet_id: &str, _gid: Option<&str>) -> Result<Vec<Record>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.fail_with {
                Some(status) => Err(AppError::Upstream { status }),
                None => Ok(self.rows.clone()),
            }
        }
    }

    fn row(date: &str) -> Record {
        Record {
            date: Some(date.to_string()),
            floor: Some("1".into()),
            general_waste_kg: 3.0,
            ..Record::default()
        }
    }

    fn cache_over(source: Arc<FakeSource>, ttl: Duration) -> RowCache {
        RowCache::new(source, Some("sheet".into()), ttl)
    }

    #[tokio::test]
    async fn second_call_within_ttl_is_cached() {
        let source = Arc::new(FakeSource::new(vec![row("2025-06-01"), row("2025-07-01")]));
        let cache = cache_over(source.clone(), Duration::days(30));

        let first = cache.resolve(&RowQuery::default()).await.unwrap();
        let second = cache.resolve(&RowQuery::default()).await.unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.records, second.records);
        assert_eq!(first.fetched_at, second.fetched_at);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let source = Arc::new(FakeSource::new(vec![row("2025-06-01")]));
        let cache = cache_over(source.clone(), Duration::zero());

        cache.resolve(&RowQuery::default()).await.unwrap();
        let again = cache.resolve(&RowQuery::default()).await.unwrap();

        assert!(!again.from_cache);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn tabs_are_cached_separately() {
        let source = Arc::new(FakeSource::new(vec![row("2025-06-01")]));
        let cache = cache_over(source.clone(), Duration::days(30));

        cache.resolve(&RowQuery::for_tab(None)).await.unwrap();
        cache.resolve(&RowQuery::for_tab(Some(String::new()))).await.unwrap();
        cache.resolve(&RowQuery::for_tab(Some("99".into()))).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn month_filter_does_not_shrink_the_cache() {
        let source = Arc::new(FakeSource::new(vec![row("2025-06-01"), row("2025-07-01")]));
        let cache = cache_over(source.clone(), Duration::days(30));

        let june = RowQuery { month: Some(6), year: Some(2025), ..RowQuery::default() };
        assert_eq!(cache.resolve(&june).await.unwrap().records.len(), 1);

        let all = cache.resolve(&RowQuery::default()).await.unwrap();
        assert!(all.from_cache);
        assert_eq!(all.records.len(), 2);
    }

    #[tokio::test]
    async fn warm_up_fills_the_cache() {
        let source = Arc::new(FakeSource::new(vec![row("2025-06-01"), row("2025-07-01")]));
        let cache = cache_over(source.clone(), Duration::days(30));

        assert_eq!(cache.warm_up(StdDuration::from_secs(5)).await, Some(2));
        assert!(cache.resolve(&RowQuery::default()).await.unwrap().from_cache);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn warm_up_gives_up_on_a_slow_sheet() {
        let source = Arc::new(FakeSource::slow(vec![row("2025-06-01")], StdDuration::from_millis(300)));
        let cache = cache_over(source.clone(), Duration::days(30));

        assert_eq!(cache.warm_up(StdDuration::from_millis(20)).await, None);

        // The abandoned fetch left nothing behind; later requests still work.
        let later = cache.resolve(&RowQuery::default()).await.unwrap();
        assert!(!later.from_cache);
        assert_eq!(later.records.len(), 1);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn warm_up_survives_upstream_errors() {
        let source = Arc::new(FakeSource::failing(500));
        let cache = cache_over(source.clone(), Duration::days(30));

        assert_eq!(cache.warm_up(StdDuration::from_secs(5)).await, None);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn missing_sheet_id_is_reported() {
        let source = Arc::new(FakeSource::new(Vec::new()));
        let cache = RowCache::new(source.clone(), None, Duration::days(30));

        let err = cache.resolve(&RowQuery::default()).await.unwrap_err();
        assert!(matches!(err, AppError::MissingSheetId));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_propagates_and_is_not_cached() {
        let source = Arc::new(FakeSource::failing(503));
        let cache = cache_over(source.clone(), Duration::days(30));

        let err = cache.resolve(&RowQuery::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Google Sheet error: 503");
        assert!(cache.resolve(&RowQuery::default()).await.is_err());
        assert_eq!(source.calls(), 2);
    }
}
