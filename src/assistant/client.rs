//! Chat-completion HTTP client (OpenAI-compatible)

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::fetch::Fetch;

/// Who said a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message as sent to the completion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: Role,
    pub content: String,
}

impl CompletionMessage {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [CompletionMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: CompletionMessage,
}

/// Chat-completion collaborator
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send the conversation, get the assistant's reply text
    async fn complete(&self, messages: &[CompletionMessage]) -> Result<String>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    url: String,
    key: Option<String>,
    model: String,
    client: Client,
    timeout: Option<Duration>,
}

impl ChatCompletionClient {
    pub fn new(url: &str, key: Option<&str>, model: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.map(str::to_string),
            model: model.to_string(),
            client,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ChatCompletion for ChatCompletionClient {
    async fn complete(&self, messages: &[CompletionMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.url);
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };
        debug!("requesting completion for {} messages", messages.len());

        let mut fetch = Fetch::post(&self.client, &url)
            .timeout(self.timeout)
            .on_error(Error::Chat);
        if let Some(key) = &self.key {
            fetch = fetch.bearer_auth(key);
        }

        let response = fetch
            .json(&request)?
            .execute::<CompletionResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::chat("completion returned no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_model_and_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_json(json!({
                "model": "test-model",
                "messages": [
                    { "role": "system", "content": "be kind" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Hi there" } }]
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(
            &format!("{}/v1/", server.uri()),
            Some("sk-test"),
            "test-model",
            Client::new(),
        );
        let reply = client
            .complete(&[
                CompletionMessage::new(Role::System, "be kind"),
                CompletionMessage::new(Role::User, "hello"),
            ])
            .await
            .unwrap();
        assert_eq!(reply, "Hi there");
    }

    #[tokio::test]
    async fn error_status_is_chat_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(&server.uri(), None, "m", Client::new());
        match client.complete(&[CompletionMessage::new(Role::User, "hi")]).await {
            Err(Error::Chat(msg)) => assert!(msg.contains("rate limited")),
            other => panic!("Expected Chat error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_chat_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(&server.uri(), None, "m", Client::new());
        assert!(matches!(
            client.complete(&[CompletionMessage::new(Role::User, "hi")]).await,
            Err(Error::Chat(_))
        ));
    }
}
