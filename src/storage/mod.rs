//! Blob storage for post images and avatars

use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

use crate::auth::SessionIdentity;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

/// Blob store collaborator: uploads bytes and hands back a URL
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;
}

/// Response returned by the storage API after an upload
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "Key")]
    pub key: String,
}

/// Client for the backend storage API
#[derive(Debug, Clone)]
pub struct RestBlobStore {
    /// The base URL for the backend project
    url: String,

    /// The anonymous API key for the backend project
    key: String,

    /// HTTP client used for requests
    client: Client,

    identity: Option<SessionIdentity>,

    timeout: Option<Duration>,
}

impl RestBlobStore {
    /// Create a new RestBlobStore
    pub fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            identity: None,
            timeout: None,
        }
    }

    pub fn with_identity(mut self, identity: SessionIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{url}/storage/v1/object/...` with every segment percent-encoded
    fn object_url(&self, prefix: &[&str], bucket: &str, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url)?;
        url.path_segments_mut()
            .map_err(|_| Error::config("backend URL cannot be a base"))?
            .pop_if_empty()
            .extend(["storage", "v1", "object"])
            .extend(prefix)
            .push(bucket)
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Get the public URL for a stored object
    pub fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        Ok(self.object_url(&["public"], bucket, path)?.to_string())
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = self.object_url(&[], bucket, path)?.to_string();
        let token = self
            .identity
            .as_ref()
            .and_then(SessionIdentity::access_token)
            .unwrap_or_else(|| self.key.clone());

        let size = data.len();
        Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .bearer_auth(&token)
            .header("x-upsert", "true")
            .bytes(data, content_type)
            .timeout(self.timeout)
            .on_error(Error::Storage)
            .execute::<UploadResponse>()
            .await?;

        info!("Uploaded {} bytes to {}/{}", size, bucket, path);
        self.public_url(bucket, path)
    }
}

/// Blob store kept in memory, handing out `memory://` URLs
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type and bytes stored under a URL
    pub async fn object(&self, url: &str) -> Option<(String, Vec<u8>)> {
        self.objects.read().await.get(url).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        if data.is_empty() {
            return Err(Error::storage("refusing to store an empty object"));
        }
        let url = format!("memory://{}/{}", bucket, path);
        self.objects
            .write()
            .await
            .insert(url.clone(), (content_type.to_string(), data));
        Ok(url)
    }
}
