#![allow(dead_code)]

use async_trait::async_trait;
use breastie::assistant::{ChatCompletion, CompletionMessage};
use breastie::auth::Session;
use breastie::clock::FixedClock;
use breastie::config::Config;
use breastie::error::Result;
use breastie::storage::MemoryBlobStore;
use breastie::store::MemoryDocumentStore;
use breastie::Breastie;
use chrono::{Local, TimeZone};
use std::sync::Arc;

/// Completion that always answers with the same text
pub struct Canned(pub &'static str);

#[async_trait]
impl ChatCompletion for Canned {
    async fn complete(&self, _messages: &[CompletionMessage]) -> Result<String> {
        Ok(self.0.to_string())
    }
}

pub struct Offline {
    pub breastie: Breastie,
    pub store: Arc<MemoryDocumentStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Client on in-memory backends, signed in as `u1`, with today fixed to 2025-01-10
pub fn offline() -> Offline {
    let store = Arc::new(MemoryDocumentStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let config = Config::new("https://project.example.com", "anon-key").unwrap();
    let breastie = Breastie::new(config)
        .with_backends(
            store.clone(),
            blobs.clone(),
            Arc::new(Canned("[URGENCY: MEDIUM] Please book a visit this week.")),
        )
        .with_clock(Arc::new(FixedClock(
            Local.with_ymd_and_hms(2025, 1, 10, 8, 30, 0).unwrap(),
        )));
    breastie.identity().set_session(Session::new(
        "token".to_string(),
        "refresh".to_string(),
        "u1".to_string(),
        3600,
    ));
    Offline {
        breastie,
        store,
        blobs,
    }
}
