//! Document store port.
//!
//! The bot keeps its state in named collections of schema-less JSON documents.
//! Command logic only talks to [`DocumentStore`]; the backing implementation is
//! chosen at startup.

use async_trait::async_trait;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{errors::Error, Result};

mod collections;
pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

pub const USERS: &str = "users";
pub const QUOTES: &str = "quotes";

pub type Document = serde_json::Map<String, Value>;

/// How to select a single document.
#[derive(Clone, Debug)]
pub enum Lookup {
    /// Every field of the query must be present and equal.
    Match(Document),
    /// The named string field must match the pattern.
    FieldRegex { field: String, pattern: Regex },
}

impl Lookup {
    pub fn field(name: &str, value: impl Into<Value>) -> Self {
        let mut query = Document::new();
        query.insert(name.to_string(), value.into());
        Self::Match(query)
    }

    pub fn regex(field: &str, pattern: &str) -> Result<Self> {
        Ok(Self::FieldRegex {
            field: field.to_string(),
            pattern: Regex::new(pattern)?,
        })
    }

    /// Build a lookup from optional parts; exactly one must be given.
    pub fn from_parts(query: Option<Document>, regex: Option<(&str, &str)>) -> Result<Self> {
        match (query, regex) {
            (Some(query), None) => Ok(Self::Match(query)),
            (None, Some((field, pattern))) => Self::regex(field, pattern),
            (None, None) => Err(Error::Usage(
                "find_one needs a query or a field regex".to_string(),
            )),
            (Some(_), Some(_)) => Err(Error::Usage(
                "find_one takes a query or a field regex, not both".to_string(),
            )),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::Match(query) => query.iter().all(|(k, v)| doc.get(k) == Some(v)),
            Self::FieldRegex { field, pattern } => doc
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| pattern.is_match(s)),
        }
    }
}

/// Persistence port used by the command handlers.
///
/// Each call is atomic on its own. Sequences of calls are not: a find followed
/// by a write can interleave with another writer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, document: Document) -> Result<()>;

    async fn find_one(&self, collection: &str, lookup: &Lookup) -> Result<Option<Document>>;

    /// Uniformly sample one document, `None` when the collection is empty.
    async fn find_random(&self, collection: &str) -> Result<Option<Document>>;

    /// Merge `updates` over the first document matching `query`.
    ///
    /// Fails with [`Error::NotFound`] when nothing matches.
    async fn replace_fields(
        &self,
        collection: &str,
        query: &Document,
        updates: Document,
    ) -> Result<()>;

    /// Add `by` to an integer field of the first matching document and return
    /// the new value. A missing field counts as zero.
    async fn increment_field(
        &self,
        collection: &str,
        query: &Document,
        field: &str,
        by: u64,
    ) -> Result<u64>;
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidArgument(format!(
            "document must serialize to an object, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Memory store whose named operations always fail.
    #[derive(Default)]
    pub(crate) struct FaultyStore {
        pub(crate) inner: MemoryStore,
        pub(crate) broken: Vec<&'static str>,
    }

    impl FaultyStore {
        pub(crate) fn failing(broken: &[&'static str]) -> Self {
            Self {
                inner: MemoryStore::new(),
                broken: broken.to_vec(),
            }
        }

        fn check(&self, op: &str) -> Result<()> {
            if self.broken.iter().any(|b| *b == op) {
                return Err(Error::External(format!("{op}: store offline")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for FaultyStore {
        async fn insert(&self, collection: &str, document: Document) -> Result<()> {
            self.check("insert")?;
            self.inner.insert(collection, document).await
        }

        async fn find_one(&self, collection: &str, lookup: &Lookup) -> Result<Option<Document>> {
            self.check("find_one")?;
            self.inner.find_one(collection, lookup).await
        }

        async fn find_random(&self, collection: &str) -> Result<Option<Document>> {
            self.check("find_random")?;
            self.inner.find_random(collection).await
        }

        async fn replace_fields(
            &self,
            collection: &str,
            query: &Document,
            updates: Document,
        ) -> Result<()> {
            self.check("replace_fields")?;
            self.inner.replace_fields(collection, query, updates).await
        }

        async fn increment_field(
            &self,
            collection: &str,
            query: &Document,
            field: &str,
            by: u64,
        ) -> Result<u64> {
            self.check("increment_field")?;
            self.inner.increment_field(collection, query, field, by).await
        }
    }
}
