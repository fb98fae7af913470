use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde_json::Value;

use super::{Document, Lookup};
use crate::{errors::Error, Result};

/// In-memory collection data shared by the store implementations.
#[derive(Debug, Default)]
pub(crate) struct Collections {
    inner: HashMap<String, Vec<Document>>,
}

impl Collections {
    pub(crate) fn with_collection(&mut self, name: String, docs: Vec<Document>) {
        self.inner.insert(name, docs);
    }

    pub(crate) fn take(&mut self, collection: &str) -> Vec<Document> {
        self.inner.remove(collection).unwrap_or_default()
    }

    pub(crate) fn docs(&self, collection: &str) -> &[Document] {
        self.inner
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn insert(&mut self, collection: &str, document: Document) -> Result<()> {
        validate_collection_name(collection)?;
        self.inner
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    pub(crate) fn find_one(&self, collection: &str, lookup: &Lookup) -> Option<Document> {
        self.docs(collection)
            .iter()
            .find(|d| lookup.matches(d))
            .cloned()
    }

    pub(crate) fn find_random(&self, collection: &str) -> Option<Document> {
        self.docs(collection)
            .choose(&mut rand::thread_rng())
            .cloned()
    }

    pub(crate) fn replace_fields(
        &mut self,
        collection: &str,
        query: &Document,
        updates: Document,
    ) -> Result<()> {
        let doc = self.find_mut(collection, query)?;
        for (k, v) in updates {
            doc.insert(k, v);
        }
        Ok(())
    }

    pub(crate) fn increment_field(
        &mut self,
        collection: &str,
        query: &Document,
        field: &str,
        by: u64,
    ) -> Result<u64> {
        let doc = self.find_mut(collection, query)?;
        let current = match doc.get(field) {
            None | Some(Value::Null) => 0,
            Some(v) => v.as_u64().ok_or_else(|| {
                Error::InvalidArgument(format!("field {field} is not a non-negative integer"))
            })?,
        };
        let next = current.saturating_add(by);
        doc.insert(field.to_string(), Value::from(next));
        Ok(next)
    }

    fn find_mut(&mut self, collection: &str, query: &Document) -> Result<&mut Document> {
        validate_collection_name(collection)?;
        let lookup = Lookup::Match(query.clone());
        self.inner
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| lookup.matches(d)))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no document in {collection} matches {}",
                    Value::Object(query.clone())
                ))
            })
    }
}

/// Collection names double as file names for the JSON store.
pub(crate) fn validate_collection_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "invalid collection name: {name:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn replace_fields_merges_over_existing() {
        let mut c = Collections::default();
        c.insert("users", doc(json!({"user_id": 1, "is_moderator": false, "num_commands": 4})))
            .unwrap();
        c.replace_fields(
            "users",
            &doc(json!({"user_id": 1})),
            doc(json!({"is_moderator": true})),
        )
        .unwrap();

        let got = c.find_one("users", &Lookup::field("user_id", 1)).unwrap();
        assert_eq!(got["is_moderator"], json!(true));
        assert_eq!(got["num_commands"], json!(4));
        assert_eq!(c.docs("users").len(), 1);
    }

    #[test]
    fn replace_fields_without_match_is_not_found() {
        let mut c = Collections::default();
        let err = c
            .replace_fields("users", &doc(json!({"user_id": 1})), Document::new())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn increment_treats_missing_field_as_zero() {
        let mut c = Collections::default();
        c.insert("users", doc(json!({"user_id": 1}))).unwrap();
        let q = doc(json!({"user_id": 1}));
        assert_eq!(c.increment_field("users", &q, "num_commands", 1).unwrap(), 1);
        assert_eq!(c.increment_field("users", &q, "num_commands", 2).unwrap(), 3);
    }

    #[test]
    fn increment_rejects_non_integer_field() {
        let mut c = Collections::default();
        c.insert("users", doc(json!({"user_id": 1, "num_commands": "many"})))
            .unwrap();
        let err = c
            .increment_field("users", &doc(json!({"user_id": 1})), "num_commands", 1)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn rejects_bad_collection_names() {
        let mut c = Collections::default();
        assert!(matches!(
            c.insert("", Document::new()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            c.insert("../etc", Document::new()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn random_on_empty_collection_is_none() {
        let c = Collections::default();
        assert!(c.find_random("quotes").is_none());
    }
}
