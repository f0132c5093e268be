use snipvec_common::{Result, SnipvecError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::persistence::{JournalBackend, PersistenceBackend};
use crate::record::{ScoredRecord, VectorRecord};
use crate::similarity::{cosine_score, top_n};

/// Brute-force vector store
///
/// Every search scores the query against all stored records. The backend is
/// chosen by type at construction and opened by [`VectorStore::initialize`].
#[derive(Debug)]
pub struct VectorStore<B: PersistenceBackend = JournalBackend> {
    backend: Option<B>,
    location: Option<PathBuf>,
}

impl<B: PersistenceBackend> Default for VectorStore<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: PersistenceBackend> VectorStore<B> {
    /// Create an uninitialized store
    pub fn new() -> Self {
        Self {
            backend: None,
            location: None,
        }
    }

    /// Create and initialize in one step
    pub fn open(location: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::new();
        store.initialize(location)?;
        Ok(store)
    }

    /// Open or create the backend bound to `location`.
    ///
    /// Re-initializing with the location already open keeps the current handle;
    /// a different location replaces it.
    pub fn initialize(&mut self, location: impl AsRef<Path>) -> Result<()> {
        let location = location.as_ref();

        if self.backend.is_some() && self.location.as_deref() == Some(location) {
            debug!("Vector store already open: {}", location.display());
            return Ok(());
        }

        let backend = B::open(location)?;
        let count = backend.len()?;
        self.backend = Some(backend);
        self.location = Some(location.to_path_buf());

        info!("Vector store initialized - {} records ({})", count, location.display());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Location the backend was opened with
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn backend(&self) -> Result<&B> {
        self.backend.as_ref().ok_or(SnipvecError::NotInitialized)
    }

    fn backend_mut(&mut self) -> Result<&mut B> {
        self.backend.as_mut().ok_or(SnipvecError::NotInitialized)
    }

    /// Upsert a record, assigning a UUID when `id` is empty.
    ///
    /// Embeddings with NaN or infinite components are rejected on every backend.
    pub fn save(&mut self, mut record: VectorRecord) -> Result<VectorRecord> {
        let backend = self.backend_mut()?;

        if let Some(pos) = record.embedding.iter().position(|x| !x.is_finite()) {
            return Err(SnipvecError::invalid_input(format!(
                "embedding component {} is not finite ({})",
                pos, record.embedding[pos]
            )));
        }

        if record.id.is_empty() {
            record.id = uuid::Uuid::new_v4().to_string();
        }

        backend.put(&record.id, &record)?;
        debug!("Saved record {} (dimension {})", record.id, record.dimension());
        Ok(record)
    }

    /// Exact lookup by id
    pub fn get(&self, id: &str) -> Result<VectorRecord> {
        self.backend()?
            .get(id)?
            .ok_or_else(|| SnipvecError::not_found(format!("vector record '{}'", id)))
    }

    /// All records in storage order.
    ///
    /// An empty store is reported as [`SnipvecError::EmptyStore`].
    pub fn get_all(&self) -> Result<Vec<VectorRecord>> {
        let records = self.backend()?.scan_all(|_| true)?;
        if records.is_empty() {
            return Err(SnipvecError::EmptyStore);
        }
        Ok(records)
    }

    /// Number of stored records (zero is not an error here)
    pub fn count(&self) -> Result<usize> {
        self.backend()?.len()
    }

    /// Records scoring at least `threshold` against `query`, in storage order
    pub fn search_similarities(&self, query: &[f64], threshold: f64) -> Result<Vec<ScoredRecord>> {
        let records = self.get_all()?;
        let candidates = records.len();

        let mut results = Vec::new();
        for record in records {
            let score = cosine_score(query, &record.embedding)?;
            if score >= threshold {
                results.push(ScoredRecord::new(record, score));
            }
        }

        debug!(
            "Similarity search - {} of {} records scored >= {}",
            results.len(),
            candidates,
            threshold
        );
        Ok(results)
    }

    /// The `max_count` best records scoring at least `threshold`, best first.
    ///
    /// Equal scores keep storage order.
    pub fn search_top_n(
        &self,
        query: &[f64],
        threshold: f64,
        max_count: usize,
    ) -> Result<Vec<ScoredRecord>> {
        let results = top_n(self.search_similarities(query, threshold)?, max_count);
        info!("Search completed - {} results (max {})", results.len(), max_count);
        Ok(results)
    }

    /// Compact the backend's write log
    pub fn compact(&mut self) -> Result<()> {
        self.backend_mut()?.compact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryBackend;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn memory_store() -> VectorStore<MemoryBackend> {
        VectorStore::open("memory").unwrap()
    }

    /// A = [1,0,0], B = [0,1,0]
    fn store_ab() -> VectorStore<MemoryBackend> {
        let mut store = memory_store();
        store.save(VectorRecord::new("foo", vec![1.0, 0.0, 0.0]).with_id("A")).unwrap();
        store.save(VectorRecord::new("bar", vec![0.0, 1.0, 0.0]).with_id("B")).unwrap();
        store
    }

    fn ids(results: &[ScoredRecord]) -> Vec<&str> {
        results.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_operations_require_initialize() {
        let mut store: VectorStore<MemoryBackend> = VectorStore::new();
        assert!(!store.is_initialized());

        assert!(matches!(store.get("a"), Err(SnipvecError::NotInitialized)));
        assert!(matches!(store.get_all(), Err(SnipvecError::NotInitialized)));
        assert!(matches!(store.count(), Err(SnipvecError::NotInitialized)));
        assert!(matches!(
            store.search_top_n(&[1.0], 0.0, 1),
            Err(SnipvecError::NotInitialized)
        ));
        assert!(matches!(
            store.save(VectorRecord::new("foo", vec![1.0])),
            Err(SnipvecError::NotInitialized)
        ));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("vectors.jsonl");

        let mut store: VectorStore = VectorStore::new();
        store.initialize(&path).unwrap();
        store.save(VectorRecord::new("foo", vec![1.0]).with_id("a")).unwrap();

        // Same location keeps the open handle
        store.initialize(&path).unwrap();
        assert_eq!(store.get("a").unwrap().prompt, "foo");

        // Fresh location
        let fresh = tmp.path().join("fresh.jsonl");
        store.initialize(&fresh).unwrap();
        assert_eq!(store.location(), Some(fresh.as_path()));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_save_assigns_unique_ids() {
        let mut store = memory_store();
        let mut seen = HashSet::new();
        for i in 0..20 {
            let saved = store.save(VectorRecord::new(format!("p{}", i), vec![i as f64])).unwrap();
            assert!(!saved.id.is_empty());
            assert!(seen.insert(saved.id));
        }
        assert_eq!(store.count().unwrap(), 20);
    }

    #[test]
    fn test_save_keeps_explicit_id() {
        let mut store = memory_store();
        let saved = store.save(VectorRecord::new("foo", vec![0.1, 0.2, 0.3]).with_id("test1")).unwrap();
        assert_eq!(saved.id, "test1");
    }

    #[test]
    fn test_save_overwrites_existing_id() {
        let mut store = memory_store();
        store.save(VectorRecord::new("old", vec![1.0, 0.0]).with_id("x")).unwrap();
        store.save(VectorRecord::new("new", vec![0.0, 1.0]).with_id("x")).unwrap();

        let record = store.get("x").unwrap();
        assert_eq!(record.prompt, "new");
        assert_eq!(record.embedding, vec![0.0, 1.0]);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_save_rejects_non_finite_embedding() {
        let mut store = memory_store();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = store.save(VectorRecord::new("bad", vec![1.0, bad]).with_id("bad")).unwrap_err();
            assert!(matches!(err, SnipvecError::InvalidInput(_)));
        }
        assert!(matches!(store.get("bad"), Err(SnipvecError::NotFound(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_round_trip() {
        let mut store = memory_store();
        let record = VectorRecord::new("Another test prompt", vec![0.4, 0.5, 0.6])
            .with_metadata("key", "value");
        let saved = store.save(record.clone()).unwrap();

        let fetched = store.get(&saved.id).unwrap();
        assert_eq!(fetched.prompt, record.prompt);
        assert_eq!(fetched.embedding, record.embedding);
        assert_eq!(fetched.metadata, record.metadata);
    }

    #[test]
    fn test_get_unknown_id() {
        let store = store_ab();
        assert!(matches!(store.get("non-existent"), Err(SnipvecError::NotFound(_))));
    }

    #[test]
    fn test_empty_store() {
        let store = memory_store();
        assert!(matches!(store.get_all(), Err(SnipvecError::EmptyStore)));
        assert!(matches!(
            store.search_similarities(&[1.0, 0.0, 0.0], 0.0),
            Err(SnipvecError::EmptyStore)
        ));
        assert!(matches!(
            store.search_top_n(&[1.0, 0.0, 0.0], 0.0, 3),
            Err(SnipvecError::EmptyStore)
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_get_all_storage_order() {
        let store = store_ab();
        let all: Vec<String> = store.get_all().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(all, vec!["A", "B"]);
    }

    #[test]
    fn test_top_match() {
        let store = store_ab();
        let results = store.search_top_n(&[1.0, 0.0, 0.0], 0.5, 1).unwrap();
        assert_eq!(ids(&results), vec!["A"]);
        assert!((results[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_excludes_orthogonal() {
        let store = store_ab();
        let results = store.search_top_n(&[0.0, 1.0, 0.0], 0.9, 5).unwrap();
        assert_eq!(ids(&results), vec!["B"]);
    }

    #[test]
    fn test_tie_keeps_storage_order() {
        let store = store_ab();
        let results = store.search_top_n(&[0.7, 0.7, 0.0], 0.5, 2).unwrap();
        assert_eq!(ids(&results), vec!["A", "B"]);
        for result in &results {
            assert!((result.score - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_dimension_mismatch_fails_search() {
        let mut store = memory_store();
        store.save(VectorRecord::new("wide", vec![1.0, 0.0, 0.0, 0.0])).unwrap();

        let err = store.search_top_n(&[1.0, 0.0, 0.0], 0.0, 1).unwrap_err();
        assert!(matches!(err, SnipvecError::LengthMismatch { left: 3, right: 4 }));
    }

    #[test]
    fn test_search_respects_threshold() {
        let mut store = memory_store();
        let embeddings = [
            vec![0.1, 0.2, 0.3],
            vec![0.4, 0.5, 0.6],
            vec![0.7, 0.8, 0.9],
            vec![-1.0, 0.1, -0.2],
            vec![0.0, 0.0, 0.0],
        ];
        for (i, embedding) in embeddings.iter().enumerate() {
            store.save(VectorRecord::new(format!("Test {}", i), embedding.clone())).unwrap();
        }

        let query = [0.15, 0.25, 0.35];
        for threshold in [-1.0, -0.5, 0.0, 0.5, 0.9, 0.99, 1.0] {
            let results = store.search_similarities(&query, threshold).unwrap();
            assert!(results.iter().all(|r| r.score >= threshold));
        }

        // Zero vector scores 0.0 and is kept at threshold 0
        let results = store.search_similarities(&query, 0.0).unwrap();
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn test_top_n_bounded_and_sorted() {
        let mut store = memory_store();
        for i in 0..10 {
            let angle = i as f64 * 0.3;
            store.save(VectorRecord::new(format!("p{}", i), vec![angle.cos(), angle.sin()])).unwrap();
        }

        for max in [0, 1, 3, 10, 50] {
            let results = store.search_top_n(&[1.0, 0.0], -1.0, max).unwrap();
            assert!(results.len() <= max);
            assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        }

        let best = store.search_top_n(&[1.0, 0.0], -1.0, 1).unwrap();
        assert_eq!(best[0].prompt(), "p0");
    }

    #[test]
    fn test_no_match_is_empty_result() {
        let store = store_ab();
        let results = store.search_top_n(&[0.0, 0.0, 1.0], 0.5, 3).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_journal_store_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("vectors.jsonl");

        {
            let mut store: VectorStore = VectorStore::open(&path).unwrap();
            store.save(VectorRecord::new("foo", vec![1.0, 0.0, 0.0]).with_id("A")).unwrap();
            store.save(VectorRecord::new("bar", vec![0.0, 1.0, 0.0]).with_id("B")).unwrap();
            store.compact().unwrap();
        }

        let store: VectorStore = VectorStore::open(&path).unwrap();
        let results = store.search_top_n(&[0.7, 0.7, 0.0], 0.5, 2).unwrap();
        assert_eq!(ids(&results), vec!["A", "B"]);
    }
}
