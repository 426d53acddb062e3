use crate::index::{IndexBuilder, IndexSnapshot, IndexingStats};
use crate::store::DocumentStore;
use crate::{query, Document, PostingSet};
use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Owns the document store and the live index.
///
/// Queries run against an `Arc` snapshot and never mutate it, so any number
/// may run concurrently. A rebuild constructs a fresh snapshot and swaps it in;
/// rebuilds are serialized.
pub struct SearchEngine {
    store: Arc<dyn DocumentStore>,
    live: RwLock<Arc<IndexSnapshot>>,
    rebuild: Mutex<()>,
}

impl SearchEngine {
    /// An engine with an empty index. Call [`build_index`](Self::build_index) to populate it.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, live: RwLock::new(Arc::new(IndexSnapshot::default())), rebuild: Mutex::new(()) }
    }

    /// Re-read the corpus and replace the live index.
    ///
    /// If the store fails, the error is returned and the previous index stays live.
    pub fn build_index(&self) -> Result<IndexingStats> {
        let _guard = self.rebuild.lock();
        let mut builder = IndexBuilder::new();
        let documents = self.store.fetch_all_documents()?;
        for doc in &documents {
            builder.add_document(doc);
        }
        let snapshot = Arc::new(builder.finish());
        let stats = snapshot.stats.clone();
        *self.live.write() = snapshot;
        Ok(stats)
    }

    /// Stats of the last completed build.
    pub fn stats(&self) -> IndexingStats {
        self.live.read().stats.clone()
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.live.read().clone()
    }

    pub fn search(&self, query: &str) -> PostingSet {
        let snapshot = self.snapshot();
        query::search(query, &snapshot.index)
    }

    pub fn fetch_documents(&self, ids: &PostingSet) -> Vec<Document> {
        self.store.fetch_documents_by_ids(ids)
    }
}
