//! Breastie client core
//!
//! The non-UI half of a breast-cancer companion app: appointment reminders
//! with their day-offset labels, support communities and the feed of their
//! posts, a health-assistant chat and the user's profile. Persistence, blob
//! storage and chat completion are collaborators behind traits, with REST
//! implementations for the hosted backend and in-memory ones for offline use.

pub mod assistant;
pub mod auth;
pub mod clock;
pub mod community;
pub mod config;
pub mod error;
pub mod fetch;
pub mod profile;
pub mod reminder;
pub mod storage;
pub mod store;

use reqwest::Client;
use std::sync::Arc;

use crate::assistant::{AssistantChat, ChatCompletion, ChatCompletionClient};
use crate::auth::SessionIdentity;
use crate::clock::{Clock, SystemClock};
use crate::community::{CommunityFeed, FeedOptions};
use crate::config::Config;
use crate::error::Result;
use crate::profile::ProfileService;
use crate::reminder::ReminderStore;
use crate::storage::{BlobStore, RestBlobStore};
use crate::store::{DocumentStore, RestDocumentStore};

/// The main entry point: wires the collaborators once and hands out services
pub struct Breastie {
    /// Client configuration
    pub config: Config,
    /// HTTP client shared by every REST collaborator
    pub http_client: Client,
    identity: SessionIdentity,
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    completion: Arc<dyn ChatCompletion>,
    clock: Arc<dyn Clock>,
}

impl Breastie {
    /// Create a client talking to the hosted backend
    ///
    /// # Example
    ///
    /// ```
    /// use breastie::{config::Config, Breastie};
    ///
    /// let config = Config::new("https://your-project.example.com", "your-anon-key").unwrap();
    /// let breastie = Breastie::new(config);
    /// ```
    pub fn new(config: Config) -> Self {
        let http_client = Client::new();
        let identity = SessionIdentity::new();

        let store = RestDocumentStore::new(&config.base_url(), &config.anon_key, http_client.clone())
            .with_identity(identity.clone())
            .with_timeout(config.request_timeout);
        let blobs = RestBlobStore::new(&config.base_url(), &config.anon_key, http_client.clone())
            .with_identity(identity.clone())
            .with_timeout(config.request_timeout);
        let completion = ChatCompletionClient::new(
            &config.llm_base_url(),
            config.llm_key.as_deref(),
            &config.llm_model,
            http_client.clone(),
        )
        .with_timeout(config.request_timeout);

        Self {
            config,
            http_client,
            identity,
            store: Arc::new(store),
            blobs: Arc::new(blobs),
            completion: Arc::new(completion),
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a client from `BREASTIE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    /// Replace the collaborators, e.g. with in-memory ones
    pub fn with_backends(
        mut self,
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        completion: Arc<dyn ChatCompletion>,
    ) -> Self {
        self.store = store;
        self.blobs = blobs;
        self.completion = completion;
        self
    }

    /// Replace the clock used for "today"
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Session holder the shell feeds after sign-in
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Reminder list of the signed-in user
    pub fn reminders(&self) -> ReminderStore {
        ReminderStore::new(
            self.store.clone(),
            Arc::new(self.identity.clone()),
            self.clock.clone(),
        )
    }

    /// Joined communities and their feed
    pub fn community(&self) -> CommunityFeed {
        let options = FeedOptions {
            page_size: self.config.feed_page_size,
            media_bucket: self.config.media_bucket.clone(),
        };
        CommunityFeed::new(
            self.store.clone(),
            self.blobs.clone(),
            Arc::new(self.identity.clone()),
            self.clock.clone(),
            options,
        )
    }

    /// A fresh assistant conversation
    pub fn assistant(&self) -> AssistantChat {
        AssistantChat::new(self.completion.clone(), self.clock.clone())
    }

    /// Profile of the signed-in user
    pub fn profile(&self) -> ProfileService {
        ProfileService::new(
            self.store.clone(),
            self.blobs.clone(),
            Arc::new(self.identity.clone()),
            &self.config.media_bucket,
        )
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::assistant::{AssistantChat, Urgency};
    pub use crate::auth::{IdentityProvider, Session, SessionIdentity};
    pub use crate::community::{Community, CommunityFeed, Post, PostImage};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::profile::{Profile, ProfileService, ProfileUpdate};
    pub use crate::reminder::{DayOffset, Reminder, ReminderStore};
    pub use crate::Breastie;
}
