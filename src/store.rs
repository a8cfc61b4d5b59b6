//! Document datastore interface and local implementations.
//!
//! A datastore is opened per collection and hands out a cursor of JSON
//! documents ordered by the requested sort key. Cursors must be closed
//! explicitly by whoever opened them.

use crate::decoder::{Document, record_from_document};
use crate::error::{CodecError, Result};
use crate::models::ObservationRecord;
use crate::schema::InstrumentSchema;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;

/// Connection credentials passed through to the datastore untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
}

pub trait DocumentCursor {
    /// Next document in sort order, `None` once exhausted or closed.
    fn next_document(&mut self) -> Option<Result<Document>>;

    fn close(&mut self) -> Result<()>;
}

pub trait Datastore {
    fn open(
        &self,
        collection: &str,
        sort_key: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn DocumentCursor>>;
}

fn sort_value(doc: &Document, key: &str) -> String {
    match doc.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Object(map)) => map
            .get("$date")
            .and_then(|d| d.as_str())
            .unwrap_or_default()
            .to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn sorted(mut documents: Vec<Document>, sort_key: &str) -> VecDeque<Document> {
    documents.sort_by_cached_key(|doc| sort_value(doc, sort_key).replace('T', " "));
    documents.into()
}

/// Cursor over documents already loaded into memory.
struct BufferedCursor {
    documents: VecDeque<Document>,
    closed: bool,
    on_close: Option<Rc<Cell<usize>>>,
}

impl DocumentCursor for BufferedCursor {
    fn next_document(&mut self) -> Option<Result<Document>> {
        if self.closed {
            return None;
        }
        self.documents.pop_front().map(Ok)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.documents.clear();
            if let Some(counter) = &self.on_close {
                counter.set(counter.get() + 1);
            }
        }
        Ok(())
    }
}

/// One JSON document per line in `<root>/<collection>.jsonl`.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    root: PathBuf,
}

impl JsonLinesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.jsonl", collection))
    }

    /// Append documents to a collection, creating it if needed.
    pub fn insert_many(&self, collection: &str, documents: &[Document]) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.collection_path(collection))?;
        for doc in documents {
            serde_json::to_writer(&mut file, doc)?;
            file.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl Datastore for JsonLinesStore {
    fn open(
        &self,
        collection: &str,
        sort_key: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn DocumentCursor>> {
        let path = self.collection_path(collection);
        if let Some(user) = &credentials.user {
            return Err(CodecError::Datastore {
                collection: collection.to_string(),
                reason: format!("JSON-lines store has no authentication; refusing user {}", user),
            });
        }
        let file = fs::File::open(&path).map_err(|e| CodecError::Datastore {
            collection: collection.to_string(),
            reason: format!("cannot open {}: {}", path.display(), e),
        })?;

        let mut documents = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(&line)? {
                serde_json::Value::Object(doc) => documents.push(doc),
                _ => {
                    return Err(CodecError::Datastore {
                        collection: collection.to_string(),
                        reason: format!("line {} is not a JSON object", n + 1),
                    });
                }
            }
        }
        info!(
            "Opened collection {} ({} documents, sorted by {})",
            collection,
            documents.len(),
            sort_key
        );
        Ok(Box::new(BufferedCursor {
            documents: sorted(documents, sort_key),
            closed: false,
            on_close: None,
        }))
    }
}

/// In-memory collections; counts closed cursors.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Document>>,
    closed: Rc<Cell<usize>>,
    opened: Rc<Cell<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: impl Into<String>, documents: Vec<Document>) {
        self.collections
            .entry(collection.into())
            .or_default()
            .extend(documents);
    }

    pub fn opened_cursors(&self) -> usize {
        self.opened.get()
    }

    pub fn closed_cursors(&self) -> usize {
        self.closed.get()
    }
}

impl Datastore for MemoryStore {
    fn open(
        &self,
        collection: &str,
        sort_key: &str,
        _credentials: &Credentials,
    ) -> Result<Box<dyn DocumentCursor>> {
        let documents = self
            .collections
            .get(collection)
            .cloned()
            .ok_or_else(|| CodecError::Datastore {
                collection: collection.to_string(),
                reason: "no such collection".to_string(),
            })?;
        self.opened.set(self.opened.get() + 1);
        Ok(Box::new(BufferedCursor {
            documents: sorted(documents, sort_key),
            closed: false,
            on_close: Some(Rc::clone(&self.closed)),
        }))
    }
}

/// Records decoded from a cursor's documents; errors name the collection.
pub struct CursorRecords<'a> {
    schema: &'a InstrumentSchema,
    cursor: &'a mut dyn DocumentCursor,
    collection: &'a str,
}

impl<'a> CursorRecords<'a> {
    pub fn new(
        schema: &'a InstrumentSchema,
        cursor: &'a mut dyn DocumentCursor,
        collection: &'a str,
    ) -> Self {
        Self {
            schema,
            cursor,
            collection,
        }
    }
}

impl Iterator for CursorRecords<'_> {
    type Item = Result<ObservationRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = self.cursor.next_document()?;
        Some(
            doc.and_then(|d| record_from_document(self.schema, &d))
                .map_err(|e| e.with_source(self.collection)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(ts: &str, vis: f64) -> Document {
        match json!({"Datetime": ts, "VIS_1MIN": vis}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn drain(cursor: &mut dyn DocumentCursor) -> Vec<Document> {
        std::iter::from_fn(|| cursor.next_document())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_json_lines_sorted_by_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(temp_dir.path());
        store
            .insert_many(
                "VIS_VQ",
                &[doc("2024-01-02 00:00:00", 2.0), doc("2024-01-01 00:00:00", 1.0)],
            )
            .unwrap();

        let mut cursor = store.open("VIS_VQ", "Datetime", &Credentials::default()).unwrap();
        let docs = drain(cursor.as_mut());
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["VIS_1MIN"], 1.0);
        cursor.close().unwrap();
    }

    #[test]
    fn test_missing_collection() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(temp_dir.path());
        let err = store
            .open("AWS_VQ", "Datetime", &Credentials::default())
            .err()
            .unwrap();
        assert!(matches!(err, CodecError::Datastore { ref collection, .. } if collection == "AWS_VQ"));
    }

    #[test]
    fn test_json_lines_store_refuses_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(temp_dir.path());
        store.insert_many("VIS_VQ", &[doc("2024-01-01 00:00:00", 1.0)]).unwrap();

        let credentials = Credentials {
            user: Some("reader".to_string()),
            password: Some("secret".to_string()),
        };
        let err = store.open("VIS_VQ", "Datetime", &credentials).err().unwrap();
        assert!(matches!(err, CodecError::Datastore { ref reason, .. } if reason.contains("reader")));
        assert!(store.open("VIS_VQ", "Datetime", &Credentials::default()).is_ok());
    }

    #[test]
    fn test_memory_store_counts_closes() {
        let mut store = MemoryStore::new();
        store.insert("VIS_VQ", vec![doc("2024-01-01 00:00:00", 1.0)]);
        let mut cursor = store.open("VIS_VQ", "Datetime", &Credentials::default()).unwrap();
        cursor.close().unwrap();
        cursor.close().unwrap();
        assert!(cursor.next_document().is_none());
        assert_eq!(store.opened_cursors(), 1);
        assert_eq!(store.closed_cursors(), 1);
    }
}
