//! Document store over the backend's REST interface
//!
//! Collections map to `{url}/rest/v1/{collection path}`, documents to
//! `{collection}/{id}`. Filters use the `field=op.value` convention and
//! increments go through the `increment` RPC.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use super::{CollectionPath, Document, DocumentStore, Fields, Query};
use crate::auth::SessionIdentity;
use crate::error::{Error, Result};
use crate::fetch::{Fetch, FetchBuilder};

/// Client for the backend document API
#[derive(Debug, Clone)]
pub struct RestDocumentStore {
    /// The base URL for the backend project
    url: String,

    /// The anonymous API key for the backend project
    key: String,

    /// HTTP client
    client: Client,

    /// Session whose access token authorizes requests
    identity: Option<SessionIdentity>,

    /// Per-request timeout
    timeout: Option<Duration>,
}

impl RestDocumentStore {
    /// Create a new RestDocumentStore
    pub fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            identity: None,
            timeout: None,
        }
    }

    /// Authorize requests with the session's access token when one is live
    pub fn with_identity(mut self, identity: SessionIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let mut url = Url::parse(&self.url)?;
        url.path_segments_mut()
            .map_err(|_| Error::config("backend URL cannot be a base"))?
            .pop_if_empty()
            .extend(["rest", "v1"])
            .extend(segments);
        Ok(url.to_string())
    }

    fn collection_url(&self, collection: &CollectionPath) -> Result<String> {
        let segments: Vec<&str> = collection.segments().collect();
        self.endpoint(&segments)
    }

    fn document_url(&self, collection: &CollectionPath, id: &str) -> Result<String> {
        let mut segments: Vec<&str> = collection.segments().collect();
        segments.push(id);
        self.endpoint(&segments)
    }

    fn authorize<'a>(&self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let token = self
            .identity
            .as_ref()
            .and_then(SessionIdentity::access_token)
            .unwrap_or_else(|| self.key.clone());
        fetch
            .header("apikey", &self.key)
            .bearer_auth(&token)
            .timeout(self.timeout)
            .on_error(Error::Database)
    }
}

/// Split a returned row into id and fields
fn into_document(row: Value) -> Result<Document> {
    let mut fields = match row {
        Value::Object(fields) => fields,
        other => return Err(Error::database(format!("expected a row object, got {}", other))),
    };
    let id = match fields.remove("id") {
        Some(Value::String(id)) => id,
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(Error::database("row is missing its id")),
    };
    Ok(Document { id, fields })
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<Document>> {
        query.validate()?;
        debug!("querying {} with {:?}", collection, query);

        let url = self.collection_url(collection)?;
        let rows = self
            .authorize(Fetch::get(&self.client, &url))
            .query(query.to_params())
            .execute::<Vec<Value>>()
            .await?;

        rows.into_iter().map(into_document).collect()
    }

    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>> {
        let url = self.document_url(collection, id)?;
        let row = self
            .authorize(Fetch::get(&self.client, &url))
            .execute_optional::<Value>()
            .await?;

        row.map(into_document).transpose()
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String> {
        let url = self.collection_url(collection)?;
        let created = self
            .authorize(Fetch::post(&self.client, &url))
            .header("Prefer", "return=representation")
            .json(&fields)?
            .execute::<Value>()
            .await?;

        // Some deployments wrap the created row in an array
        let row = match created {
            Value::Array(rows) => rows
                .into_iter()
                .next()
                .ok_or_else(|| Error::database("insert returned no row"))?,
            row => row,
        };
        Ok(into_document(row)?.id)
    }

    async fn set(&self, collection: &CollectionPath, id: &str, fields: Fields) -> Result<()> {
        let url = self.document_url(collection, id)?;
        self.authorize(Fetch::put(&self.client, &url))
            .json(&fields)?
            .execute_empty()
            .await
    }

    async fn update(&self, collection: &CollectionPath, id: &str, fields: Fields) -> Result<()> {
        let url = self.document_url(collection, id)?;
        self.authorize(Fetch::patch(&self.client, &url))
            .json(&fields)?
            .execute_empty()
            .await
    }

    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()> {
        let url = self.document_url(collection, id)?;
        self.authorize(Fetch::delete(&self.client, &url))
            .execute_empty()
            .await
    }

    async fn increment(
        &self,
        collection: &CollectionPath,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<()> {
        let url = self.endpoint(&["rpc", "increment"])?;
        let body = json!({
            "collection": collection.as_str(),
            "id": id,
            "field": field,
            "delta": delta,
        });
        self.authorize(Fetch::post(&self.client, &url))
            .json(&body)?
            .execute_empty()
            .await
    }
}
