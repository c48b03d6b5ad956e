//! Configuration for the Breastie client core

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Default chat-completion endpoint (OpenAI-compatible)
pub const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Configuration for the backend and chat-completion collaborators
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend project
    pub url: Url,

    /// Anonymous API key of the backend project
    pub anon_key: String,

    /// Base URL of the chat-completion API
    pub llm_url: Url,

    /// API key for the chat-completion API
    pub llm_key: Option<String>,

    /// Chat model name
    pub llm_model: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Maximum number of posts loaded into the feed
    pub feed_page_size: usize,

    /// Bucket holding post images and avatars
    pub media_bucket: String,
}

impl Config {
    /// Creates a new configuration, validating the URL and key
    pub fn new(url: &str, anon_key: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        if anon_key.is_empty() {
            return Err(Error::config("anon_key cannot be empty"));
        }
        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
            llm_url: Url::parse(DEFAULT_LLM_URL)?,
            llm_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            feed_page_size: 50,
            media_bucket: "media".to_string(),
        })
    }

    /// Reads the configuration from the environment (and a `.env` file if present)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let url = std::env::var("BREASTIE_URL")
            .map_err(|_| Error::config("BREASTIE_URL environment variable not found"))?;
        let key = std::env::var("BREASTIE_ANON_KEY")
            .map_err(|_| Error::config("BREASTIE_ANON_KEY environment variable not found"))?;

        let mut config = Self::new(&url, &key)?;
        if let Ok(llm_url) = std::env::var("BREASTIE_LLM_URL") {
            config = config.with_llm_url(&llm_url)?;
        }
        if let Ok(llm_key) = std::env::var("BREASTIE_LLM_KEY") {
            config = config.with_llm_key(&llm_key);
        }
        if let Ok(model) = std::env::var("BREASTIE_LLM_MODEL") {
            config = config.with_llm_model(&model);
        }
        Ok(config)
    }

    /// Set the chat-completion base URL
    pub fn with_llm_url(mut self, value: &str) -> Result<Self> {
        self.llm_url = Url::parse(value)?;
        Ok(self)
    }

    /// Set the chat-completion API key
    pub fn with_llm_key(mut self, value: &str) -> Self {
        self.llm_key = Some(value.to_string());
        self
    }

    /// Set the chat model
    pub fn with_llm_model(mut self, value: &str) -> Self {
        self.llm_model = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the feed page size
    pub fn with_feed_page_size(mut self, value: usize) -> Self {
        self.feed_page_size = value;
        self
    }

    /// Set the media bucket
    pub fn with_media_bucket(mut self, value: &str) -> Self {
        self.media_bucket = value.to_string();
        self
    }

    /// Base URL without the trailing slash `Url` adds
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }

    /// Chat-completion base URL without the trailing slash
    pub fn llm_base_url(&self) -> String {
        self.llm_url.as_str().trim_end_matches('/').to_string()
    }
}
