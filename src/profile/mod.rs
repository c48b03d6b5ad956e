//! Profile of the signed-in user

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::error::{Error, Result};
use crate::storage::BlobStore;
use crate::store::{encode, fields, CollectionPath, DocumentStore};

fn users() -> CollectionPath {
    CollectionPath::root("users")
}

/// Profile document stored under `users/{uid}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing)]
    pub id: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub bio: String,

    /// Where the user is in their journey ("in treatment", "survivor", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    #[serde(default)]
    pub onboarding_completed: bool,
}

/// Fields to change; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
}

/// Reads and writes the signed-in user's profile
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    identity: Arc<dyn IdentityProvider>,
    media_bucket: String,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
        media_bucket: &str,
    ) -> Self {
        Self {
            store,
            blobs,
            identity,
            media_bucket: media_bucket.to_string(),
        }
    }

    fn user_id(&self) -> Result<String> {
        self.identity
            .current_user_id()
            .ok_or(Error::Unauthenticated)
    }

    /// The profile, `None` when signed out or not created yet
    pub async fn load(&self) -> Result<Option<Profile>> {
        let user_id = match self.identity.current_user_id() {
            Some(user_id) => user_id,
            None => return Ok(None),
        };
        self.store
            .get(&users(), &user_id)
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    /// Apply an update, creating the profile document when missing
    pub async fn update(&self, update: ProfileUpdate) -> Result<()> {
        if let Some(name) = &update.display_name {
            if name.trim().is_empty() {
                return Err(Error::validation("Name cannot be empty"));
            }
        }
        let user_id = self.user_id()?;
        let changes = encode(&update)?;

        match self.store.get(&users(), &user_id).await? {
            Some(_) => self.store.update(&users(), &user_id, changes).await?,
            None => self.store.set(&users(), &user_id, changes).await?,
        }
        info!("profile updated for {}", user_id);
        Ok(())
    }

    /// Upload a new avatar and point the profile at it
    pub async fn upload_avatar(&self, data: Vec<u8>, content_type: &str) -> Result<String> {
        if data.is_empty() {
            return Err(Error::validation("Image is empty"));
        }
        let user_id = self.user_id()?;

        let path = format!("avatars/{}/avatar", user_id);
        let url = self
            .blobs
            .upload(&self.media_bucket, &path, data, content_type)
            .await?;

        let changes = fields([("photoUrl", Value::String(url.clone()))]);
        match self.store.get(&users(), &user_id).await? {
            Some(_) => self.store.update(&users(), &user_id, changes).await?,
            None => self.store.set(&users(), &user_id, changes).await?,
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticIdentity;
    use crate::storage::MemoryBlobStore;
    use crate::store::MemoryDocumentStore;

    fn service(identity: StaticIdentity) -> (Arc<MemoryDocumentStore>, ProfileService) {
        let store = Arc::new(MemoryDocumentStore::new());
        let service = ProfileService::new(
            store.clone(),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(identity),
            "media",
        );
        (store, service)
    }

    #[tokio::test]
    async fn signed_out_profile_is_none() {
        let (_, profiles) = service(StaticIdentity::signed_out());
        assert_eq!(profiles.load().await.unwrap(), None);
        assert!(matches!(
            profiles.update(ProfileUpdate::default()).await,
            Err(Error::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn update_creates_then_merges() {
        let (_, profiles) = service(StaticIdentity::signed_in("u1"));
        profiles
            .update(ProfileUpdate {
                display_name: Some("Rina".to_string()),
                bio: Some("Two years out".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        profiles
            .update(ProfileUpdate {
                onboarding_completed: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        let profile = profiles.load().await.unwrap().unwrap();
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.display_name, "Rina");
        assert_eq!(profile.bio, "Two years out");
        assert!(profile.onboarding_completed);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (store, profiles) = service(StaticIdentity::signed_in("u1"));
        let update = ProfileUpdate {
            display_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(profiles.update(update).await, Err(Error::Validation(_))));
        assert!(store.get(&users(), "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn avatar_url_is_saved() {
        let (_, profiles) = service(StaticIdentity::signed_in("u1"));
        let url = profiles.upload_avatar(vec![1, 2, 3], "image/jpeg").await.unwrap();
        assert_eq!(url, "memory://media/avatars/u1/avatar");
        let profile = profiles.load().await.unwrap().unwrap();
        assert_eq!(profile.photo_url, Some(url));
    }
}
