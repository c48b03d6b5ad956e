//! The joined-community-id set
//!
//! The set is the single source of truth for the feed's scope. Each change
//! replaces it with a new immutable snapshot; watchers see every snapshot.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;

use super::types::CommunityId;

/// Immutable view of the joined set at one point in time
pub type Snapshot = Arc<BTreeSet<CommunityId>>;

/// Observable set of joined community ids
#[derive(Debug)]
pub struct JoinedCommunities {
    tx: watch::Sender<Snapshot>,
}

impl Default for JoinedCommunities {
    fn default() -> Self {
        let (tx, _) = watch::channel(Snapshot::default());
        Self { tx }
    }
}

impl JoinedCommunities {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot
    pub fn current(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tx.borrow().contains(id)
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Replace the set wholesale; returns whether it changed
    ///
    /// An identical set publishes nothing.
    pub fn replace(&self, ids: BTreeSet<CommunityId>) -> bool {
        self.tx.send_if_modified(|current| {
            if **current == ids {
                return false;
            }
            *current = Arc::new(ids);
            true
        })
    }

    /// Add one id; returns whether the set changed
    pub fn insert(&self, id: &str) -> bool {
        let mut ids = (*self.current()).clone();
        ids.insert(id.to_string());
        self.replace(ids)
    }

    /// Remove one id; returns whether the set changed
    pub fn remove(&self, id: &str) -> bool {
        let mut ids = (*self.current()).clone();
        ids.remove(id);
        self.replace(ids)
    }
}
