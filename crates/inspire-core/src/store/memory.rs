use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{collections::Collections, Document, DocumentStore, Lookup};
use crate::Result;

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.data.lock().await.docs(collection).len()
    }

    pub async fn all(&self, collection: &str) -> Vec<Document> {
        self.data.lock().await.docs(collection).to_vec()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<()> {
        self.data.lock().await.insert(collection, document)
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
        self.data
            .lock()
            .await
            .replace_fields(collection, query, updates)
    }

    async fn increment_field(
        &self,
        collection: &str,
        query: &Document,
        field: &str,
        by: u64,
    ) -> Result<u64> {
        self.data
            .lock()
            .await
            .increment_field(collection, query, field, by)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryStore::new();
        let doc = json!({"quote_text": "live fast", "quote_author": "nietzsche"});
        store
            .insert("quotes", doc.as_object().cloned().unwrap())
            .await
            .unwrap();

        let found = store
            .find_one("quotes", &Lookup::field("quote_text", "live fast"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["quote_author"], json!("nietzsche"));
        assert_eq!(store.len("quotes").await, 1);
    }

    #[tokio::test]
    async fn random_returns_the_only_document() {
        let store = MemoryStore::new();
        store
            .insert("quotes", json!({"n": 1}).as_object().cloned().unwrap())
            .await
            .unwrap();
        let got = store.find_random("quotes").await.unwrap().unwrap();
        assert_eq!(got["n"], json!(1));
        assert!(store.find_random("empty").await.unwrap().is_none());
    }
}
