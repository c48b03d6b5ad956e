//! Identity of the current user
//!
//! Sign-in flows live outside this crate. The shell hands the session it
//! obtained to [`SessionIdentity`], and everything else only asks for the
//! current user id.

mod session;

use log::info;
use std::sync::{Arc, RwLock};

pub use session::*;

/// Exposes the current user id, or `None` when nobody is signed in
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Identity backed by the session the shell obtained from the identity provider
#[derive(Debug, Clone, Default)]
pub struct SessionIdentity {
    session: Arc<RwLock<Option<Session>>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current session, if it has not expired
    pub fn session(&self) -> Option<Session> {
        let current = self.session.read().ok()?;
        current.as_ref().filter(|s| !s.is_expired()).cloned()
    }

    /// Replace the session
    pub fn set_session(&self, session: Session) {
        info!("Session set for user {}", session.user_id);
        if let Ok(mut current) = self.session.write() {
            *current = Some(session);
        }
    }

    /// Forget the session
    pub fn clear(&self) {
        if let Ok(mut current) = self.session.write() {
            *current = None;
        }
    }

    /// Access token of the live session
    pub fn access_token(&self) -> Option<String> {
        self.session().map(|s| s.access_token)
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.session().map(|s| s.user_id)
    }
}

/// Identity pinned to a fixed value
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl StaticIdentity {
    pub fn signed_in(user_id: &str) -> Self {
        Self(Some(user_id.to_string()))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}
