//! Community and post documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque community identifier
pub type CommunityId = String;

/// A support community users can join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    #[serde(default, skip_serializing)]
    pub id: CommunityId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub member_count: i64,
}

/// A forum post inside one community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, skip_serializing)]
    pub id: String,

    pub community_id: CommunityId,

    pub author_id: String,

    #[serde(default)]
    pub author_name: String,

    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default)]
    pub likes: i64,

    #[serde(default)]
    pub comment_count: i64,

    /// Stored as epoch milliseconds so the feed can order on it
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Image attached to a new post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostImage {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl PostImage {
    pub fn new(data: Vec<u8>, content_type: &str) -> Self {
        Self {
            data,
            content_type: content_type.to_string(),
        }
    }
}
