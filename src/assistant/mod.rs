//! AI health-assistant chat

mod client;
mod urgency;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{Error, Result};

pub use client::*;
pub use urgency::*;

/// Instructions sent ahead of every conversation
pub const SYSTEM_PROMPT: &str = "You are Breastie, a warm and careful assistant for people affected by \
breast cancer. Give general, supportive health information, never a diagnosis, and encourage \
contacting a medical professional when symptoms need attention. Start every reply with \
[URGENCY: LOW], [URGENCY: MEDIUM] or [URGENCY: HIGH] reflecting how soon the user should seek care.";

/// Number of past messages sent along with a new question
pub const DEFAULT_CONTEXT_MESSAGES: usize = 20;

/// A message in the chat history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// Set on assistant replies
    pub urgency: Option<Urgency>,
    pub sent_at: DateTime<Utc>,
}

/// Conversation with the health assistant
pub struct AssistantChat {
    completion: Arc<dyn ChatCompletion>,
    clock: Arc<dyn Clock>,
    history: Vec<ChatMessage>,
    context_messages: usize,
}

impl AssistantChat {
    pub fn new(completion: Arc<dyn ChatCompletion>, clock: Arc<dyn Clock>) -> Self {
        Self {
            completion,
            clock,
            history: Vec::new(),
            context_messages: DEFAULT_CONTEXT_MESSAGES,
        }
    }

    pub fn with_context_messages(mut self, count: usize) -> Self {
        self.context_messages = count;
        self
    }

    /// Ask the assistant something
    ///
    /// The question and the reply enter the history together, only once the
    /// reply arrived.
    pub async fn send(&mut self, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::validation("Message cannot be empty"));
        }

        let skip = self.history.len().saturating_sub(self.context_messages);
        let mut messages = Vec::with_capacity(self.context_messages + 2);
        messages.push(CompletionMessage::new(Role::System, SYSTEM_PROMPT));
        messages.extend(
            self.history[skip..]
                .iter()
                .map(|m| CompletionMessage::new(m.role, &m.text)),
        );
        messages.push(CompletionMessage::new(Role::User, text));

        let asked_at = self.clock.now().with_timezone(&Utc);
        let raw = self.completion.complete(&messages).await?;
        let (urgency, reply) = parse_reply(&raw);
        info!("assistant replied with urgency {}", urgency);

        self.history.push(ChatMessage {
            role: Role::User,
            text: text.to_string(),
            urgency: None,
            sent_at: asked_at,
        });
        let reply = ChatMessage {
            role: Role::Assistant,
            text: reply,
            urgency: Some(urgency),
            sent_at: self.clock.now().with_timezone(&Utc),
        };
        self.history.push(reply.clone());
        Ok(reply)
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Urgency of the latest assistant reply
    pub fn latest_urgency(&self) -> Option<Urgency> {
        self.history.iter().rev().find_map(|m| m.urgency)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
