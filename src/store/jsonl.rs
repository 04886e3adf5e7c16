//! One-file-per-collection JSONL store behind the persistence gateway.
//!
//! Documents are written one per line under `<root>/<collection>.jsonl`.
//! This is the CLI and test stand-in for the app's document backend:
//! collections here are small (tasks, notes, reports), so updates and
//! deletes rewrite the collection file in place.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::collaborators::{CollaboratorError, Document, PersistenceGateway};

/// JSONL-backed document store rooted at one directory.
#[derive(Debug)]
pub struct JsonlStore {
    root: PathBuf,
    created: u64,
}

impl JsonlStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, CollaboratorError> {
        fs::create_dir_all(root)
            .map_err(|err| CollaboratorError::new(format!("creating store dir: {err}")))?;
        Ok(Self {
            root: root.to_path_buf(),
            created: 0,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, CollaboratorError> {
        // Collection names come from code and config, never transcripts,
        // but path separators are still rejected.
        if collection.is_empty() || collection.contains(['/', '\\', '.']) {
            return Err(CollaboratorError::new(format!(
                "invalid collection name: {collection}"
            )));
        }
        Ok(self.root.join(format!("{collection}.jsonl")))
    }

    fn load(&self, collection: &str) -> Result<Vec<Document>, CollaboratorError> {
        let path = self.collection_path(collection)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(CollaboratorError::new(format!(
                    "opening {}: {err}",
                    path.display()
                )))
            }
        };
        let reader = BufReader::new(file);
        let mut docs = Vec::new();
        for line in reader.lines() {
            let line =
                line.map_err(|err| CollaboratorError::new(format!("reading store: {err}")))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Document>(trimmed) {
                Ok(doc) => docs.push(doc),
                Err(_) => {
                    // Skip malformed lines (forward compatibility).
                    warn!(collection, "skipping malformed store line");
                }
            }
        }
        Ok(docs)
    }

    fn rewrite(&self, collection: &str, docs: &[Document]) -> Result<(), CollaboratorError> {
        let path = self.collection_path(collection)?;
        let mut file = File::create(&path)
            .map_err(|err| CollaboratorError::new(format!("rewriting store: {err}")))?;
        for doc in docs {
            let json = serde_json::to_string(doc)
                .map_err(|err| CollaboratorError::new(format!("encoding document: {err}")))?;
            writeln!(file, "{json}")
                .map_err(|err| CollaboratorError::new(format!("writing store: {err}")))?;
        }
        file.flush()
            .map_err(|err| CollaboratorError::new(format!("flushing store: {err}")))
    }

    fn next_id(&mut self) -> String {
        self.created += 1;
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("doc_{nanos:x}_{}", self.created)
    }
}

impl PersistenceGateway for JsonlStore {
    fn create(
        &mut self,
        collection: &str,
        data: serde_json::Value,
    ) -> Result<String, CollaboratorError> {
        let path = self.collection_path(collection)?;
        let id = self.next_id();
        let doc = Document {
            id: id.clone(),
            data,
        };
        let json = serde_json::to_string(&doc)
            .map_err(|err| CollaboratorError::new(format!("encoding document: {err}")))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| CollaboratorError::new(format!("opening store: {err}")))?;
        writeln!(file, "{json}")
            .map_err(|err| CollaboratorError::new(format!("appending document: {err}")))?;
        Ok(id)
    }

    fn read(&mut self, collection: &str) -> Result<Vec<Document>, CollaboratorError> {
        self.load(collection)
    }

    fn update(
        &mut self,
        collection: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), CollaboratorError> {
        let mut docs = self.load(collection)?;
        let doc = docs
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| CollaboratorError::new(format!("no document {id} in {collection}")))?;
        match (doc.data.as_object_mut(), patch.as_object()) {
            (Some(target), Some(fields)) => {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
            _ => doc.data = patch,
        }
        self.rewrite(collection, &docs)
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<(), CollaboratorError> {
        let mut docs = self.load(collection)?;
        let before = docs.len();
        docs.retain(|doc| doc.id != id);
        if docs.len() == before {
            return Err(CollaboratorError::new(format!(
                "no document {id} in {collection}"
            )));
        }
        self.rewrite(collection, &docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(suffix: &str) -> JsonlStore {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let root = std::env::temp_dir().join(format!("insight-voice-store-{suffix}-{nanos}"));
        JsonlStore::open(&root).expect("open store")
    }

    #[test]
    fn create_and_read_round_trip() {
        let mut store = temp_store("create");
        let id = store
            .create("tasks", serde_json::json!({ "title": "Buy groceries" }))
            .expect("create");
        let docs = store.read("tasks").expect("read");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert_eq!(docs[0].data["title"], "Buy groceries");
        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn update_merges_top_level_fields() {
        let mut store = temp_store("update");
        let id = store
            .create(
                "tasks",
                serde_json::json!({ "title": "Buy groceries", "status": "pending" }),
            )
            .expect("create");
        store
            .update("tasks", &id, serde_json::json!({ "status": "completed" }))
            .expect("update");
        let docs = store.read("tasks").expect("read");
        assert_eq!(docs[0].data["status"], "completed");
        assert_eq!(docs[0].data["title"], "Buy groceries", "untouched field kept");
        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn delete_removes_only_the_named_document() {
        let mut store = temp_store("delete");
        let keep = store
            .create("tasks", serde_json::json!({ "title": "Keep" }))
            .expect("create");
        let gone = store
            .create("tasks", serde_json::json!({ "title": "Gone" }))
            .expect("create");
        store.delete("tasks", &gone).expect("delete");
        let docs = store.read("tasks").expect("read");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, keep);
        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn missing_document_errors_on_update_and_delete() {
        let mut store = temp_store("missing");
        assert!(store
            .update("tasks", "nope", serde_json::json!({}))
            .is_err());
        assert!(store.delete("tasks", "nope").is_err());
        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn read_skips_malformed_lines() {
        let mut store = temp_store("malformed");
        let id = store
            .create("tasks", serde_json::json!({ "title": "Valid" }))
            .expect("create");
        let path = store.root().join("tasks.jsonl");
        let mut contents = fs::read_to_string(&path).expect("read file");
        contents.insert_str(0, "not json\n");
        fs::write(&path, contents).expect("write file");
        let docs = store.read("tasks").expect("read");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn empty_collection_reads_empty() {
        let mut store = temp_store("empty");
        assert!(store.read("tasks").expect("read").is_empty());
        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn invalid_collection_names_are_rejected() {
        let mut store = temp_store("invalid");
        assert!(store.read("../escape").is_err());
        assert!(store.read("").is_err());
        let _ = fs::remove_dir_all(store.root());
    }
}
