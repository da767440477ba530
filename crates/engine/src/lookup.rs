//! Lookup/choice cache.
//!
//! One cache per grid, shared by every cell that references the same lookup
//! target. Entries are keyed by a normalized identity of the target and hold
//! the last search results, every descriptor seen so far (for resolving raw
//! keys to display text), and the last total match count.
//!
//! Each fetch stamps a fresh [`RequestToken`]. A response is applied only if
//! its token is still the latest issued for that key; anything older is
//! dropped. In-flight requests are never aborted, just ignored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use labgrid_core::value::value_to_text;
use labgrid_core::ValueDescriptor;
use labgrid_query_client::{LookupInfo, LookupSearchRequest, QueryApi, QueryRow};

use crate::debounce::Debouncer;

/// Normalized identity of a lookup target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    pub fn new(schema: &str, query: &str, display_column: &str, key_column: &str) -> Self {
        Self(format!(
            "{}|{}|{}|{}",
            schema.to_lowercase(),
            query.to_lowercase(),
            display_column.to_lowercase(),
            key_column.to_lowercase()
        ))
    }

    pub fn for_lookup(lookup: &LookupInfo) -> Self {
        Self::new(
            &lookup.schema_name,
            &lookup.query_name,
            &lookup.display_column,
            &lookup.key_column,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity of one fetch, compared when its response arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Result of one lookup fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOutcome {
    pub descriptors: Vec<ValueDescriptor>,
    pub total_count: usize,
}

/// Read-only copy of an entry for rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LookupSnapshot {
    pub descriptors: Vec<ValueDescriptor>,
    pub is_loaded: bool,
    pub loading: bool,
    pub match_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct LookupEntry {
    results: Vec<ValueDescriptor>,
    known: Vec<ValueDescriptor>,
    is_loaded: bool,
    match_count: usize,
    error: Option<String>,
    latest: Option<RequestToken>,
    in_flight: bool,
}

impl LookupEntry {
    /// Replace-or-append by raw key.
    fn merge_known(&mut self, descriptors: &[ValueDescriptor]) {
        for d in descriptors {
            match self.known.iter_mut().find(|k| raw_matches(&k.raw, &d.raw)) {
                Some(existing) => *existing = d.clone(),
                None => self.known.push(d.clone()),
            }
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: FxHashMap<LookupKey, LookupEntry>,
    next_token: u64,
}

/// Shared lookup cache handle. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct LookupCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty entry for `key` if none exists yet.
    pub fn touch(&self, key: &LookupKey) {
        self.inner.lock().entries.entry(key.clone()).or_default();
    }

    /// Issue a new request token for `key`, creating the entry if needed.
    /// Any earlier in-flight request for the key becomes stale.
    pub fn begin_request(&self, key: &LookupKey) -> RequestToken {
        let mut inner = self.inner.lock();
        inner.next_token += 1;
        let token = RequestToken(inner.next_token);
        let entry = inner.entries.entry(key.clone()).or_default();
        entry.latest = Some(token);
        entry.in_flight = true;
        token
    }

    /// Apply a fetch result if `token` is still the latest for `key`.
    ///
    /// Returns false when the response was stale and dropped.
    pub fn apply_response(
        &self,
        key: &LookupKey,
        token: RequestToken,
        outcome: Result<SearchOutcome, String>,
    ) -> bool {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.entries.get_mut(key) else {
            log::debug!("Dropping lookup response for reset key {}", key.as_str());
            return false;
        };
        if entry.latest != Some(token) {
            log::debug!("Dropping stale lookup response {:?} for {}", token, key.as_str());
            return false;
        }

        entry.in_flight = false;
        match outcome {
            Ok(outcome) => {
                entry.merge_known(&outcome.descriptors);
                entry.results = outcome.descriptors;
                entry.match_count = outcome.total_count;
                entry.is_loaded = true;
                entry.error = None;
            }
            Err(message) => {
                log::warn!("Lookup fetch failed for {}: {}", key.as_str(), message);
                entry.results.clear();
                entry.match_count = 0;
                entry.error = Some(message);
            }
        }
        true
    }

    /// Merge descriptors into the known set (replace-or-append by raw key).
    pub fn merge(&self, key: &LookupKey, descriptors: &[ValueDescriptor]) {
        let mut inner = self.inner.lock();
        inner
            .entries
            .entry(key.clone())
            .or_default()
            .merge_known(descriptors);
    }

    pub fn snapshot(&self, key: &LookupKey) -> Option<LookupSnapshot> {
        let inner = self.inner.lock();
        inner.entries.get(key).map(|e| LookupSnapshot {
            descriptors: e.results.clone(),
            is_loaded: e.is_loaded,
            loading: e.in_flight,
            match_count: e.match_count,
            error: e.error.clone(),
        })
    }

    pub fn is_loaded(&self, key: &LookupKey) -> bool {
        self.inner.lock().entries.get(key).is_some_and(|e| e.is_loaded)
    }

    pub fn is_in_flight(&self, key: &LookupKey) -> bool {
        self.inner.lock().entries.get(key).is_some_and(|e| e.in_flight)
    }

    /// Known descriptor whose raw key matches (numbers and numeric text compare equal).
    pub fn find_by_raw(&self, key: &LookupKey, raw: &Value) -> Option<ValueDescriptor> {
        let inner = self.inner.lock();
        inner
            .entries
            .get(key)?
            .known
            .iter()
            .find(|d| raw_matches(&d.raw, raw))
            .cloned()
    }

    /// Known descriptor whose display text matches, ignoring case.
    pub fn find_by_display(&self, key: &LookupKey, text: &str) -> Option<ValueDescriptor> {
        let needle = text.trim().to_lowercase();
        let inner = self.inner.lock();
        inner
            .entries
            .get(key)?
            .known
            .iter()
            .find(|d| d.display_text().to_lowercase() == needle)
            .cloned()
    }

    /// Placeholder text for cells of an errored lookup.
    pub fn placeholder(&self, key: &LookupKey) -> Option<String> {
        let inner = self.inner.lock();
        let entry = inner.entries.get(key)?;
        entry.error.as_ref().map(|msg| format!("Error: {}", msg))
    }

    /// Drop one entry. Responses still in flight for it will be ignored.
    pub fn reset(&self, key: &LookupKey) {
        self.inner.lock().entries.remove(key);
    }

    pub fn reset_all(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch options for `lookup`, filtered by `token` when given.
    ///
    /// The blocking API call runs on smol's blocking pool. Returns true if the
    /// response was applied, false if a newer request superseded it.
    pub async fn search(
        &self,
        api: Arc<dyn QueryApi>,
        lookup: &LookupInfo,
        token: Option<&str>,
        page_size: usize,
    ) -> bool {
        let key = LookupKey::for_lookup(lookup);
        let request_token = self.begin_request(&key);

        let mut req = LookupSearchRequest::new(lookup.clone(), page_size);
        if let Some(token) = token {
            req = req.with_token(token).with_exact_match();
        }

        let outcome = smol::unblock(move || {
            api.search_lookup(&req).map(|resp| SearchOutcome {
                descriptors: descriptors_from_rows(&req.lookup, &resp.rows),
                total_count: resp.total_count,
            })
        })
        .await;

        self.apply_response(&key, request_token, outcome.map_err(|e| e.to_string()))
    }

    /// Initial unfiltered fetch on first access. No-op if loaded or loading.
    pub async fn ensure_loaded(
        &self,
        api: Arc<dyn QueryApi>,
        lookup: &LookupInfo,
        page_size: usize,
    ) -> bool {
        let key = LookupKey::for_lookup(lookup);
        if self.is_loaded(&key) || self.is_in_flight(&key) {
            return false;
        }
        self.search(api, lookup, None, page_size).await
    }
}

/// Convert fetched lookup rows to descriptors: key column -> raw, display column -> display.
pub fn descriptors_from_rows(lookup: &LookupInfo, rows: &[QueryRow]) -> Vec<ValueDescriptor> {
    rows.iter()
        .filter_map(|row| {
            let raw = row.get(&lookup.key_column)?.value.clone();
            let display = row
                .get(&lookup.display_column)
                .map(|f| f.display_value.clone().unwrap_or_else(|| f.value.clone()))
                .filter(|v| !v.is_null())
                .unwrap_or_else(|| raw.clone());
            Some(ValueDescriptor { raw, display })
        })
        .collect()
}

/// Raw keys match exactly, or by text when one side is a number and the other a string.
fn raw_matches(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            value_to_text(a).trim() == value_to_text(b).trim()
        }
        _ => false,
    }
}

/// Debounced search input for one open lookup editor.
#[derive(Debug, Clone)]
pub struct SearchDebounce {
    debounce: Debouncer,
    pending: Option<String>,
}

impl SearchDebounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            debounce: Debouncer::new(delay),
            pending: None,
        }
    }

    /// The user typed; restart the wait with the latest text.
    pub fn input(&mut self, text: &str, now: Instant) {
        self.pending = Some(text.to_string());
        self.debounce.start(now);
    }

    /// Text to search for, once the user has paused long enough.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        if self.debounce.fire_if_due(now) {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn cancel(&mut self) {
        self.debounce.cancel();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labgrid_query_client::{
        FieldValue, FilterOp, QueryError, SchemaQuery, SelectRowsRequest, SelectRowsResponse,
    };
    use serde_json::{json, Map};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn lookup() -> LookupInfo {
        LookupInfo::new("exp", "Materials", "RowId", "Name")
    }

    fn key() -> LookupKey {
        LookupKey::for_lookup(&lookup())
    }

    fn outcome(names: &[(i64, &str)]) -> Result<SearchOutcome, String> {
        Ok(SearchOutcome {
            descriptors: names.iter().map(|(id, n)| ValueDescriptor::new(*id, *n)).collect(),
            total_count: names.len(),
        })
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let upper = LookupInfo::new("EXP", "materials", "rowid", "NAME");
        assert_eq!(LookupKey::for_lookup(&upper), key());
        let other = LookupInfo::new("exp", "Materials", "RowId", "Description");
        assert_ne!(LookupKey::for_lookup(&other), key());
    }

    #[test]
    fn test_late_older_response_is_dropped() {
        let cache = LookupCache::new();
        let a = cache.begin_request(&key());
        let b = cache.begin_request(&key());

        assert!(cache.apply_response(&key(), b, outcome(&[(2, "B")])));
        assert!(!cache.apply_response(&key(), a, outcome(&[(1, "A")])));

        let snap = cache.snapshot(&key()).unwrap();
        assert_eq!(snap.descriptors, vec![ValueDescriptor::new(2, "B")]);
        assert!(snap.is_loaded);
        assert!(!snap.loading);
    }

    #[test]
    fn test_older_response_dropped_even_if_first() {
        let cache = LookupCache::new();
        let a = cache.begin_request(&key());
        let b = cache.begin_request(&key());

        assert!(!cache.apply_response(&key(), a, outcome(&[(1, "A")])));
        assert!(cache.is_in_flight(&key()));
        assert!(cache.apply_response(&key(), b, outcome(&[(2, "B")])));
        assert_eq!(cache.snapshot(&key()).unwrap().match_count, 1);
    }

    #[test]
    fn test_tokens_are_per_key() {
        let cache = LookupCache::new();
        let other = LookupKey::new("core", "Users", "DisplayName", "UserId");
        let a = cache.begin_request(&key());
        let _b = cache.begin_request(&other);
        assert!(cache.apply_response(&key(), a, outcome(&[(1, "A")])));
    }

    #[test]
    fn test_error_recorded_as_placeholder() {
        let cache = LookupCache::new();
        let t = cache.begin_request(&key());
        assert!(cache.apply_response(&key(), t, Err("HTTP 500: boom".into())));
        assert_eq!(cache.placeholder(&key()).as_deref(), Some("Error: HTTP 500: boom"));
        assert!(!cache.is_loaded(&key()));

        let t = cache.begin_request(&key());
        cache.apply_response(&key(), t, outcome(&[(1, "A")]));
        assert!(cache.placeholder(&key()).is_none());
    }

    #[test]
    fn test_known_descriptors_survive_narrower_search() {
        let cache = LookupCache::new();
        let t = cache.begin_request(&key());
        cache.apply_response(&key(), t, outcome(&[(1, "S-1"), (2, "S-2")]));
        let t = cache.begin_request(&key());
        cache.apply_response(&key(), t, outcome(&[(2, "S-2 (renamed)")]));

        assert_eq!(cache.snapshot(&key()).unwrap().descriptors.len(), 1);
        assert_eq!(
            cache.find_by_raw(&key(), &json!(1)),
            Some(ValueDescriptor::new(1, "S-1"))
        );
        assert_eq!(
            cache.find_by_raw(&key(), &json!(2)),
            Some(ValueDescriptor::new(2, "S-2 (renamed)"))
        );
    }

    #[test]
    fn test_find_by_raw_text_and_display() {
        let cache = LookupCache::new();
        cache.merge(&key(), &[ValueDescriptor::new(5, "Plasma")]);
        assert!(cache.find_by_raw(&key(), &json!("5")).is_some());
        assert!(cache.find_by_raw(&key(), &json!(6)).is_none());
        assert_eq!(
            cache.find_by_display(&key(), " plasma "),
            Some(ValueDescriptor::new(5, "Plasma"))
        );
    }

    #[test]
    fn test_reset_drops_in_flight_response() {
        let cache = LookupCache::new();
        let t = cache.begin_request(&key());
        cache.reset(&key());
        assert!(!cache.apply_response(&key(), t, outcome(&[(1, "A")])));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_descriptors_from_rows() {
        let mut row = QueryRow::new();
        row.insert("RowId".into(), FieldValue::new(3));
        row.insert("Name".into(), FieldValue::new("S-3"));
        let mut no_display = QueryRow::new();
        no_display.insert("RowId".into(), FieldValue::new(4));
        let no_key = QueryRow::new();

        let ds = descriptors_from_rows(&lookup(), &[row, no_display, no_key]);
        assert_eq!(ds, vec![ValueDescriptor::new(3, "S-3"), ValueDescriptor::new(4, 4)]);
    }

    #[test]
    fn test_search_debounce() {
        let t0 = Instant::now();
        let ms = Duration::from_millis(1);
        let mut search = SearchDebounce::new(350 * ms);
        search.input("S", t0);
        search.input("S-1", t0 + 100 * ms);
        assert_eq!(search.poll(t0 + 400 * ms), None);
        assert_eq!(search.poll(t0 + 450 * ms).as_deref(), Some("S-1"));
        assert_eq!(search.poll(t0 + 900 * ms), None);
    }

    /// Answers "slow" searches after a delay and everything else immediately.
    struct SlowApi {
        calls: AtomicUsize,
    }

    impl QueryApi for SlowApi {
        fn select_rows(&self, req: &SelectRowsRequest) -> Result<SelectRowsResponse, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let token = req
                .filters
                .iter()
                .find(|f| f.op == FilterOp::Contains)
                .map(|f| f.value.clone())
                .unwrap_or_default();
            if token == "slow" {
                std::thread::sleep(Duration::from_millis(150));
            }
            if token == "fail" {
                return Err(QueryError::Http(500, "boom".into()));
            }
            let mut row = QueryRow::new();
            row.insert("RowId".into(), FieldValue::new(1));
            row.insert("Name".into(), FieldValue::new(format!("{}-result", token)));
            Ok(SelectRowsResponse { rows: vec![row], row_count: 1 })
        }

        fn insert_rows(&self, _: &SchemaQuery, _: &[Map<String, Value>]) -> Result<(), QueryError> {
            Ok(())
        }

        fn update_rows(&self, _: &SchemaQuery, _: &[Map<String, Value>]) -> Result<(), QueryError> {
            Ok(())
        }
    }

    #[test]
    fn test_async_last_request_wins() {
        let cache = LookupCache::new();
        let api: Arc<dyn QueryApi> = Arc::new(SlowApi { calls: AtomicUsize::new(0) });

        let (slow_applied, fast_applied) = smol::block_on(smol::future::zip(
            cache.search(api.clone(), &lookup(), Some("slow"), 10),
            cache.search(api.clone(), &lookup(), Some("fast"), 10),
        ));

        assert!(!slow_applied);
        assert!(fast_applied);
        let snap = cache.snapshot(&key()).unwrap();
        assert_eq!(snap.descriptors[0].display, json!("fast-result"));
    }

    #[test]
    fn test_async_fetch_error_is_recorded() {
        let cache = LookupCache::new();
        let api: Arc<dyn QueryApi> = Arc::new(SlowApi { calls: AtomicUsize::new(0) });
        assert!(smol::block_on(cache.search(api, &lookup(), Some("fail"), 10)));
        assert_eq!(cache.placeholder(&key()).as_deref(), Some("Error: HTTP 500: boom"));
    }

    #[test]
    fn test_ensure_loaded_fetches_once() {
        let cache = LookupCache::new();
        let slow = Arc::new(SlowApi { calls: AtomicUsize::new(0) });
        let api: Arc<dyn QueryApi> = slow.clone();

        assert!(smol::block_on(cache.ensure_loaded(api.clone(), &lookup(), 10)));
        assert!(!smol::block_on(cache.ensure_loaded(api, &lookup(), 10)));
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_loaded(&key()));
    }
}
