//! Document store contract and its implementations
//!
//! Documents live in collections addressed by a slash-separated path
//! (`users/{uid}/reminders`). Each document has an opaque id and a JSON
//! object of fields.

mod filter;
mod memory;
mod query;
mod rest;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};

pub use filter::*;
pub use memory::MemoryDocumentStore;
pub use query::*;
pub use rest::RestDocumentStore;

/// Field map of one document
pub type Fields = Map<String, Value>;

/// Slash-separated collection address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// A top-level collection
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    /// A sub-collection of one document in this collection
    pub fn sub(&self, doc_id: &str, name: &str) -> Self {
        Self(format!("{}/{}/{}", self.0, doc_id, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, for building URLs
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: &str, fields: Fields) -> Self {
        Self {
            id: id.to_string(),
            fields,
        }
    }

    /// Deserialize the fields into `T`, exposing the document id as `id`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Serialize `value` into a field map; any `id` field is dropped
pub fn encode<T: Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(Error::database(format!(
            "expected an object to store, got {}",
            other
        ))),
    }
}

/// Document database collaborator
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a filtered, ordered, limited query
    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>>;

    /// Fetch one document, `None` when it does not exist
    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>>;

    /// Create a document with a store-assigned id and return the id
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String>;

    /// Create or replace a document under a known id
    async fn set(&self, collection: &CollectionPath, id: &str, fields: Fields) -> Result<()>;

    /// Merge fields into an existing document
    async fn update(&self, collection: &CollectionPath, id: &str, fields: Fields) -> Result<()>;

    /// Delete a document
    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()>;

    /// Atomically add `delta` to a numeric field
    async fn increment(
        &self,
        collection: &CollectionPath,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<()>;
}

/// Build a field map from `(name, value)` pairs
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
