//! Community feed scoped to the joined-community-id set
//!
//! Membership changes flow one way: a mutation writes to the document store,
//! publishes a new snapshot of the joined set, and the feed reducer reloads
//! the posts for exactly that snapshot. Callers never refresh by hand.

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use super::membership::{JoinedCommunities, Snapshot};
use super::types::{Community, CommunityId, Post, PostImage};
use crate::auth::IdentityProvider;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::storage::BlobStore;
use crate::store::{encode, fields, CollectionPath, DocumentStore, Query, SortOrder};

pub fn communities_collection() -> CollectionPath {
    CollectionPath::root("communities")
}

pub fn posts_collection() -> CollectionPath {
    CollectionPath::root("posts")
}

pub fn users_collection() -> CollectionPath {
    CollectionPath::root("users")
}

/// Membership documents of one user, keyed by community id
pub fn memberships_collection(user_id: &str) -> CollectionPath {
    users_collection().sub(user_id, "joinedCommunities")
}

/// What the feed screen renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    /// The joined set the posts were loaded for
    pub scope: Snapshot,

    /// Newest first
    pub posts: Vec<Post>,

    /// User-facing text of the last failed reload
    pub error: Option<String>,
}

/// Options for the feed
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub page_size: usize,
    pub media_bucket: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            page_size: 50,
            media_bucket: "media".to_string(),
        }
    }
}

/// Joined communities plus the feed they scope
pub struct CommunityFeed {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    options: FeedOptions,
    joined: JoinedCommunities,
    state: watch::Sender<FeedState>,
}

impl CommunityFeed {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        options: FeedOptions,
    ) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            store,
            blobs,
            identity,
            clock,
            options,
            joined: JoinedCommunities::new(),
            state,
        }
    }

    /// All communities, by name
    pub async fn list_communities(&self) -> Result<Vec<Community>> {
        let query = Query::new().order("name", SortOrder::Ascending);
        self.store
            .query(&communities_collection(), &query)
            .await?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Replace the joined set with the user's stored memberships
    ///
    /// Signed out, the set becomes empty.
    pub async fn load_memberships(&mut self) -> Result<()> {
        let ids: BTreeSet<CommunityId> = match self.identity.current_user_id() {
            Some(user_id) => self
                .store
                .query(&memberships_collection(&user_id), &Query::new())
                .await?
                .into_iter()
                .map(|doc| doc.id)
                .collect(),
            None => BTreeSet::new(),
        };
        info!("user belongs to {} communities", ids.len());
        let changed = self.joined.replace(ids);
        self.react(changed).await
    }

    /// Join a community
    pub async fn join(&mut self, community_id: &str) -> Result<()> {
        if self.joined.contains(community_id) {
            return Ok(());
        }
        let user_id = self.user_id()?;
        let memberships = memberships_collection(&user_id);

        if self.store.get(&memberships, community_id).await?.is_some() {
            debug!("already a member of {}", community_id);
        } else {
            let joined_at = self.clock.now().with_timezone(&Utc).timestamp_millis();
            self.store
                .set(
                    &memberships,
                    community_id,
                    fields([("joinedAt", json!(joined_at))]),
                )
                .await?;
            self.store
                .increment(&communities_collection(), community_id, "memberCount", 1)
                .await?;
            info!("joined community {}", community_id);
        }

        let changed = self.joined.insert(community_id);
        self.react(changed).await
    }

    /// Leave a community
    pub async fn leave(&mut self, community_id: &str) -> Result<()> {
        if !self.joined.contains(community_id) {
            return Ok(());
        }
        let user_id = self.user_id()?;

        self.store
            .delete(&memberships_collection(&user_id), community_id)
            .await?;
        self.store
            .increment(&communities_collection(), community_id, "memberCount", -1)
            .await?;

        info!("left community {}", community_id);
        let changed = self.joined.remove(community_id);
        self.react(changed).await
    }

    /// Reducer over joined-set snapshots: a new snapshot means one reload
    ///
    /// An unchanged snapshot still reloads while the feed does not reflect it,
    /// which is the case after a failed load.
    async fn react(&self, changed: bool) -> Result<()> {
        if changed || self.is_stale() {
            self.reload().await
        } else {
            debug!("joined set unchanged, feed left as is");
            Ok(())
        }
    }

    /// The feed was not loaded for the current snapshot
    fn is_stale(&self) -> bool {
        let scope = self.joined.current();
        let state = self.state.borrow();
        state.error.is_some() || *state.scope != *scope
    }

    /// Load the feed for the current snapshot of the joined set
    ///
    /// An empty set clears the feed without querying. On failure the previous
    /// posts stay and the error is recorded for display.
    async fn reload(&self) -> Result<()> {
        let scope = self.joined.current();
        if scope.is_empty() {
            debug!("no joined communities, clearing feed");
            self.state.send_replace(FeedState {
                scope,
                posts: Vec::new(),
                error: None,
            });
            return Ok(());
        }

        let query = Query::new()
            .in_list("communityId", scope.iter().cloned())
            .order("createdAt", SortOrder::Descending)
            .limit(self.options.page_size);

        let loaded = self
            .store
            .query(&posts_collection(), &query)
            .await
            .and_then(|docs| docs.iter().map(|doc| doc.decode::<Post>()).collect::<Result<Vec<_>>>());

        match loaded {
            Ok(posts) => {
                debug!("feed loaded {} posts for {} communities", posts.len(), scope.len());
                self.state.send_replace(FeedState {
                    scope,
                    posts,
                    error: None,
                });
                Ok(())
            }
            Err(err) => {
                warn!("feed reload failed: {}", err);
                let message = err.user_message();
                self.state.send_modify(|state| state.error = Some(message));
                Err(err)
            }
        }
    }

    /// Retry loading the feed after a failure
    pub async fn retry(&self) -> Result<()> {
        self.reload().await
    }

    /// Create a post in a joined community, uploading its image first
    pub async fn create_post(
        &mut self,
        community_id: &str,
        content: &str,
        image: Option<PostImage>,
    ) -> Result<Post> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::validation("Post cannot be empty"));
        }
        if !self.joined.contains(community_id) {
            return Err(Error::validation("Join the community to post in it"));
        }
        let user_id = self.user_id()?;

        let author_name = self
            .store
            .get(&users_collection(), &user_id)
            .await?
            .and_then(|doc| doc.fields.get("displayName").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| "Anonymous".to_string());

        let image_url = match image {
            Some(image) => {
                let path = format!("posts/{}/{}", user_id, Uuid::new_v4());
                Some(
                    self.blobs
                        .upload(&self.options.media_bucket, &path, image.data, &image.content_type)
                        .await?,
                )
            }
            None => None,
        };

        let mut post = Post {
            id: String::new(),
            community_id: community_id.to_string(),
            author_id: user_id,
            author_name,
            content: content.to_string(),
            image_url,
            likes: 0,
            comment_count: 0,
            created_at: self.clock.now().with_timezone(&Utc),
        };
        post.id = self.store.add(&posts_collection(), encode(&post)?).await?;
        info!("created post {} in {}", post.id, community_id);

        let page_size = self.options.page_size;
        let created = post.clone();
        self.state.send_modify(|state| {
            state.posts.insert(0, created);
            state.posts.truncate(page_size);
        });
        Ok(post)
    }

    /// Like a post
    pub async fn like_post(&mut self, post_id: &str) -> Result<()> {
        self.user_id()?;
        self.store
            .increment(&posts_collection(), post_id, "likes", 1)
            .await?;

        self.state.send_modify(|state| {
            if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
                post.likes += 1;
            }
        });
        Ok(())
    }

    /// The joined-community-id set
    pub fn joined(&self) -> Snapshot {
        self.joined.current()
    }

    /// Receive every joined-set snapshot
    pub fn subscribe_joined(&self) -> watch::Receiver<Snapshot> {
        self.joined.subscribe()
    }

    /// The current feed
    pub fn feed(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Receive every feed update
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    fn user_id(&self) -> Result<String> {
        self.identity
            .current_user_id()
            .ok_or(Error::Unauthenticated)
    }
}
