use std::{fs, path::PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    collections::{validate_collection_name, Collections},
    Document, DocumentStore, Lookup,
};
use crate::Result;

/// Store persisted as one `<collection>.json` array per collection.
///
/// Everything is loaded at open. Each mutation rewrites the touched
/// collection's file (temp file + rename) while holding the store lock, and
/// memory is only updated once that write has succeeded.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    data: Mutex<Collections>,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut data = Collections::default();
        for ent in fs::read_dir(&dir)?.flatten() {
            let path = ent.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_collection_name(name).is_err() {
                continue;
            }
            let docs: Vec<Document> = serde_json::from_str(&fs::read_to_string(&path)?)?;
            debug!(collection = name, count = docs.len(), "loaded collection");
            data.with_collection(name.to_string(), docs);
        }

        info!(dir = %dir.display(), "opened json document store");
        Ok(Self {
            dir,
            data: Mutex::new(data),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    async fn write_collection(&self, collection: &str, docs: &[Document]) -> Result<()> {
        let path = self.collection_path(collection);
        let tmp = self.dir.join(format!(".{collection}.json.tmp"));
        let body = serde_json::to_vec_pretty(docs)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Apply `op` to a copy of one collection, persist the copy, then swap it
    /// into memory. Nothing changes unless the write succeeds.
    async fn mutate<T>(
        &self,
        collection: &str,
        op: impl FnOnce(&mut Collections) -> Result<T>,
    ) -> Result<T> {
        let mut data = self.data.lock().await;

        let mut scratch = Collections::default();
        scratch.with_collection(collection.to_string(), data.docs(collection).to_vec());
        let out = op(&mut scratch)?;

        let docs = scratch.take(collection);
        self.write_collection(collection, &docs).await?;
        data.with_collection(collection.to_string(), docs);
        Ok(out)
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<()> {
        self.mutate(collection, |c| c.insert(collection, document))
            .await
    }

    async fn find_one(&self, collection: &str, lookup: &Lookup) -> Result<Option<Document>> {
        Ok(self.data.lock().await.find_one(collection, lookup))
    }

    async fn find_random(&self, collection: &str) -> Result<Option<Document>> {
        Ok(self.data.lock().await.find_random(collection))
    }

    async fn replace_fields(
        &self,
        collection: &str,
        query: &Document,
        updates: Document,
    ) -> Result<()> {
        self.mutate(collection, |c| c.replace_fields(collection, query, updates))
            .await
    }

    async fn increment_field(
        &self,
        collection: &str,
        query: &Document,
        field: &str,
        by: u64,
    ) -> Result<u64> {
        self.mutate(collection, |c| c.increment_field(collection, query, field, by))
            .await
    }
}
