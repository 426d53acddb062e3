//! Boolean full-text search over Russian-language documents.
//!
//! Text is split into Cyrillic runs and stemmed ([`tokenizer`], [`stemmer`]),
//! collected into an inverted index ([`index`]) and queried with `&&`, `||`,
//! `!` and parentheses ([`query`]). [`engine::SearchEngine`] ties these to a
//! [`store::DocumentStore`].

use serde::{Deserialize, Serialize};

pub mod containers;
pub mod engine;
pub mod index;
pub mod query;
pub mod set_ops;
pub mod stemmer;
pub mod store;
pub mod tokenizer;

/// Normalized word stem used as an index key.
pub type Term = String;
/// Opaque identifier assigned by the document store.
pub type DocId = String;
/// Every document containing a given term.
pub type PostingSet = containers::HashSet<DocId>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    #[serde(default)]
    pub pageid: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
}

impl Document {
    pub fn new(id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pageid: 0,
            title: String::new(),
            text: text.into(),
            url: String::new(),
            created_at: 0,
        }
    }
}
