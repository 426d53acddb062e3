use crate::containers::{HashMap, MapIter};
use crate::stemmer::stem;
use crate::tokenizer::tokenize;
use crate::{Document, PostingSet, Term};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const TOP_FREQUENCIES: usize = 10;

/// Corpus-wide occurrence count per term.
pub type TermFrequencyTable = HashMap<Term, u64>;

/// Term → posting set. Also tracks every document that contributed at least
/// one term, which is the universe `!` negates against.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    postings: HashMap<Term, PostingSet>,
    universe: PostingSet,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `doc_id` contains `term`. Repeated pairs are absorbed.
    pub fn add(&mut self, term: Term, doc_id: &str) {
        let postings = self.postings.get_or_insert_default(term);
        if postings.contains(doc_id) {
            return;
        }
        postings.insert(doc_id.to_string());
        self.universe.insert(doc_id.to_string());
    }

    /// Posting set for an already stemmed term. Never inserts.
    pub fn postings(&self, term: &str) -> Option<&PostingSet> {
        self.postings.get(term)
    }

    pub fn universe(&self) -> &PostingSet {
        &self.universe
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn iter(&self) -> MapIter<'_, Term, PostingSet> {
        self.postings.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexingStats {
    pub docs_count: u64,
    pub total_bytes: u64,
    pub total_tokens: u64,
    /// Sum of raw (pre-stem) token lengths, in characters.
    pub total_chars: u64,
    pub elapsed_seconds: f64,
    /// Highest term frequencies, descending. At most ten.
    pub top_frequencies: Vec<u64>,
}

impl IndexingStats {
    pub fn total_bytes_kb(&self) -> f64 {
        self.total_bytes as f64 / 1024.0
    }

    pub fn avg_token_length(&self) -> f64 {
        if self.total_tokens == 0 {
            return 0.0;
        }
        self.total_chars as f64 / self.total_tokens as f64
    }

    pub fn indexing_speed_kb_per_sec(&self) -> f64 {
        if self.elapsed_seconds <= 0.0 {
            return 0.0;
        }
        self.total_bytes_kb() / self.elapsed_seconds
    }
}

/// Output of one build: read-only from here on.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    pub index: InvertedIndex,
    pub frequencies: TermFrequencyTable,
    pub stats: IndexingStats,
}

/// Single-pass index construction. The clock starts when the builder is
/// created, so fetching the corpus after `new()` counts towards build time.
pub struct IndexBuilder {
    index: InvertedIndex,
    frequencies: TermFrequencyTable,
    stats: IndexingStats,
    started: Instant,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            index: InvertedIndex::new(),
            frequencies: TermFrequencyTable::new(),
            stats: IndexingStats::default(),
            started: Instant::now(),
        }
    }

    pub fn add_document(&mut self, doc: &Document) {
        self.stats.docs_count += 1;
        self.stats.total_bytes += doc.text.len() as u64;

        for token in tokenize(&doc.text) {
            self.stats.total_tokens += 1;
            self.stats.total_chars += token.chars().count() as u64;

            let term = stem(&token);
            *self.frequencies.get_or_insert_default(term.clone()) += 1;
            self.index.add(term, &doc.id);
        }
    }

    pub fn finish(self) -> IndexSnapshot {
        let mut stats = self.stats;
        stats.elapsed_seconds = self.started.elapsed().as_secs_f64();

        let mut freqs: Vec<u64> = self.frequencies.values().copied().collect();
        freqs.sort_unstable_by(|a, b| b.cmp(a));
        freqs.truncate(TOP_FREQUENCIES);
        stats.top_frequencies = freqs;

        tracing::info!(
            docs = stats.docs_count,
            terms = self.index.term_count(),
            tokens = stats.total_tokens,
            elapsed_s = stats.elapsed_seconds,
            "index build complete"
        );
        IndexSnapshot { index: self.index, frequencies: self.frequencies, stats }
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a snapshot from an in-memory document stream.
pub fn build_index<'a, I>(documents: I) -> IndexSnapshot
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut builder = IndexBuilder::new();
    for doc in documents {
        builder.add_document(doc);
    }
    builder.finish()
}
