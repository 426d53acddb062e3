//! Document storage collaborators.
//!
//! The index only needs two things from storage: the full corpus at build
//! time, and documents for a set of ids after a query.

use crate::containers::HashMap;
use crate::{DocId, Document, PostingSet};
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub trait DocumentStore: Send + Sync {
    /// Every document, in corpus order.
    fn fetch_all_documents(&self) -> Result<Vec<Document>>;

    /// Documents whose id is in `ids`, in corpus order. Unknown ids are skipped.
    fn fetch_documents_by_ids(&self, ids: &PostingSet) -> Vec<Document>;
}

/// Documents plus an id → position lookup. A later duplicate id shadows an earlier one.
#[derive(Debug, Default)]
struct Catalog {
    documents: Vec<Document>,
    positions: HashMap<DocId, usize>,
}

impl Catalog {
    fn new(documents: Vec<Document>) -> Self {
        let mut positions = HashMap::new();
        for (pos, doc) in documents.iter().enumerate() {
            positions.insert(doc.id.clone(), pos);
        }
        Self { documents, positions }
    }

    fn select(&self, ids: &PostingSet) -> Vec<Document> {
        let mut found: Vec<usize> = ids.iter().filter_map(|id| self.positions.get(id.as_str()).copied()).collect();
        found.sort_unstable();
        found.into_iter().map(|pos| self.documents[pos].clone()).collect()
    }
}

/// Fixed in-memory corpus.
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: Catalog,
}

impl MemoryStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { catalog: Catalog::new(documents) }
    }
}

impl DocumentStore for MemoryStore {
    fn fetch_all_documents(&self) -> Result<Vec<Document>> {
        Ok(self.catalog.documents.clone())
    }

    fn fetch_documents_by_ids(&self, ids: &PostingSet) -> Vec<Document> {
        self.catalog.select(ids)
    }
}

/// Corpus stored as `.json` / `.jsonl` files under a file or directory path.
///
/// `.jsonl` files hold one document per line; `.json` files hold a single
/// document or an array of them. Records that fail to decode are logged and
/// skipped. The corpus is re-read on every [`fetch_all_documents`] call and the
/// result cached for id lookups.
///
/// [`fetch_all_documents`]: DocumentStore::fetch_all_documents
pub struct JsonlStore {
    root: PathBuf,
    catalog: RwLock<Catalog>,
}

impl JsonlStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf(), catalog: RwLock::new(Catalog::default()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn corpus_files(&self) -> Result<Vec<PathBuf>> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }
        if !self.root.is_dir() {
            anyhow::bail!("corpus path {} does not exist", self.root.display());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }
}

impl DocumentStore for JsonlStore {
    fn fetch_all_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for file in self.corpus_files()? {
            let before = documents.len();
            if extension(&file) == Some("json") {
                read_json(&file, &mut documents)?;
            } else {
                read_jsonl(&file, &mut documents)?;
            }
            tracing::debug!(file = %file.display(), docs = documents.len() - before, "read corpus file");
        }
        tracing::info!(root = %self.root.display(), docs = documents.len(), "loaded corpus");
        *self.catalog.write() = Catalog::new(documents.clone());
        Ok(documents)
    }

    fn fetch_documents_by_ids(&self, ids: &PostingSet) -> Vec<Document> {
        self.catalog.read().select(ids)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path, out: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line = match std::str::from_utf8(&line) {
            Ok(s) => s.trim(),
            Err(err) => {
                tracing::warn!(file = %file.display(), line = lineno + 1, %err, "skipping non UTF-8 record");
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Document>(line) {
            Ok(doc) => out.push(doc),
            Err(err) => tracing::warn!(file = %file.display(), line = lineno + 1, %err, "skipping malformed record"),
        }
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let json: serde_json::Value = match serde_json::from_reader(BufReader::new(f)) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(file = %file.display(), %err, "skipping unparseable corpus file");
            return Ok(());
        }
    };
    let records = match json {
        serde_json::Value::Array(arr) => arr,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => Vec::new(),
    };
    for v in records {
        match serde_json::from_value::<Document>(v) {
            Ok(doc) => out.push(doc),
            Err(err) => tracing::warn!(file = %file.display(), %err, "skipping malformed record"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn ids(list: &[&str]) -> PostingSet {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn memory_store_selects_in_corpus_order() {
        let store = MemoryStore::new(vec![
            Document::new("a", "один"),
            Document::new("b", "два"),
            Document::new("c", "три"),
        ]);
        let docs = store.fetch_documents_by_ids(&ids(&["c", "a", "zzz"]));
        let got: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(got, vec!["a", "c"]);
    }

    #[test]
    fn jsonl_store_reads_directory_and_skips_bad_records() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("part1.jsonl"),
            concat!(
                r#"{"id":"1","title":"Первый","text":"Кот","url":"http://a","pageid":7,"created_at":100}"#,
                "\n\nnot json\n",
                r#"{"id":"2","text":"Пёс"}"#,
                "\n"
            ),
        )
        .unwrap();
        fs::write(dir.path().join("part2.json"), r#"[{"id":"3","text":"Мышь"}, {"title":"no id"}]"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = JsonlStore::new(dir.path());
        let docs = store.fetch_all_documents().unwrap();
        let got: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(got, vec!["1", "2", "3"]);
        assert_eq!(docs[0].pageid, 7);
        assert_eq!(docs[1].url, "");

        let found = store.fetch_documents_by_ids(&ids(&["3", "1"]));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].title, "Первый");
    }

    #[test]
    fn jsonl_store_rejects_invalid_utf8_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let mut bytes = b"{\"id\":\"1\",\"text\":\"\xff\"}\n".to_vec();
        bytes.extend_from_slice(r#"{"id":"2","text":"ок"}"#.as_bytes());
        fs::write(&path, bytes).unwrap();

        let docs = JsonlStore::new(&path).fetch_all_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "2");
    }

    #[test]
    fn missing_corpus_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(JsonlStore::new(dir.path().join("absent")).fetch_all_documents().is_err());
    }
}
