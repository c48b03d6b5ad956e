//! Session data for the signed-in user

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Session issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The access token sent as bearer on backend requests
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The stable user id
    pub user_id: String,

    /// The token type
    pub token_type: String,

    /// The expiry time in seconds
    pub expires_in: i64,

    /// The expiry timestamp (unix seconds)
    pub expires_at: Option<i64>,
}

impl Session {
    /// Create a new session expiring `expires_in` seconds from now
    pub fn new(
        access_token: String,
        refresh_token: String,
        user_id: String,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            user_id,
            token_type: "bearer".to_string(),
            expires_in,
            expires_at: Some(Utc::now().timestamp() + expires_in),
        }
    }

    /// Sessions without an expiry never expire
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map_or(false, |at| Utc::now().timestamp() >= at)
    }
}
