//! Urgency tag the assistant puts in front of each reply

use serde::{Deserialize, Serialize};
use std::fmt;

/// How soon the user should seek care, as judged by the assistant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High => "HIGH",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Urgency::Low),
            "MEDIUM" => Some(Urgency::Medium),
            "HIGH" => Some(Urgency::High),
            _ => None,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a reply into its urgency and the text shown to the user
///
/// The tag is `[URGENCY: LOW|MEDIUM|HIGH]` at the very start of the reply,
/// case-insensitive. A missing or unknown tag means `Low` and the reply is
/// kept whole.
pub fn parse_reply(reply: &str) -> (Urgency, String) {
    let trimmed = reply.trim_start();
    let tagged = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .and_then(|(tag, text)| {
            let (key, value) = tag.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("urgency") {
                return None;
            }
            Urgency::from_tag(value).map(|urgency| (urgency, text.trim().to_string()))
        });

    tagged.unwrap_or_else(|| (Urgency::Low, reply.trim().to_string()))
}
