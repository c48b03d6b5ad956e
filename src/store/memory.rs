//! In-process document store

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{compare_values, CollectionPath, Document, DocumentStore, Fields, Query, SortOrder};
use crate::error::{Error, Result};

/// Document store kept in memory
///
/// Used offline and in tests. It counts the queries it evaluates and can be
/// told to fail every write or the queries on one collection, which lets
/// callers observe their failure paths.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<CollectionPath, BTreeMap<String, Fields>>>,
    queries: Mutex<HashMap<CollectionPath, usize>>,
    fail_writes: AtomicBool,
    failing_queries: Mutex<HashSet<CollectionPath>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `query` calls that reached the store
    pub fn queries_issued(&self) -> usize {
        self.queries
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    /// Number of `query` calls against one collection
    pub fn queries_on(&self, collection: &CollectionPath) -> usize {
        self.queries
            .lock()
            .ok()
            .and_then(|counts| counts.get(collection).copied())
            .unwrap_or(0)
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make queries on one collection fail (or succeed again)
    pub fn set_fail_queries_on(&self, collection: &CollectionPath, fail: bool) {
        if let Ok(mut failing) = self.failing_queries.lock() {
            if fail {
                failing.insert(collection.clone());
            } else {
                failing.remove(collection);
            }
        }
    }

    /// Number of documents in a collection
    pub async fn len(&self, collection: &CollectionPath) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::database("write rejected by store"));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>> {
        query.validate()?;
        if let Ok(mut counts) = self.queries.lock() {
            *counts.entry(collection.clone()).or_default() += 1;
        }
        debug!("memory query on {}: {:?}", collection, query);
        let failing = self
            .failing_queries
            .lock()
            .map(|failing| failing.contains(collection))
            .unwrap_or(false);
        if failing {
            return Err(Error::database(format!("query on {} rejected by store", collection)));
        }

        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| {
                        query
                            .filters
                            .iter()
                            .all(|f| f.operator.matches(fields.get(&f.field), &f.value))
                    })
                    .map(|(id, fields)| Document::new(id, fields.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, order)) = &query.order {
            docs.sort_by(|a, b| {
                let ord = compare_values(
                    a.fields.get(field).unwrap_or(&Value::Null),
                    b.fields.get(field).unwrap_or(&Value::Null),
                );
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String> {
        self.check_writable()?;
        let id = Uuid::new_v4().to_string();
        self.collections
            .write()
            .await
            .entry(collection.clone())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn set(&self, collection: &CollectionPath, id: &str, fields: Fields) -> Result<()> {
        self.check_writable()?;
        self.collections
            .write()
            .await
            .entry(collection.clone())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn update(&self, collection: &CollectionPath, id: &str, fields: Fields) -> Result<()> {
        self.check_writable()?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| Error::not_found(format!("{}/{}", collection, id)))?;
        doc.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()> {
        self.check_writable()?;
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn increment(
        &self,
        collection: &CollectionPath,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<()> {
        self.check_writable()?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| Error::not_found(format!("{}/{}", collection, id)))?;
        let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
        doc.insert(field.to_string(), Value::from(current + delta));
        Ok(())
    }
}
