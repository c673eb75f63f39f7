//! `message` events and their predicates.
//!
//! See <https://api.slack.com/events/message>.

use crate::handler::{BoxPredicate, Predicate};
use crate::RequestContext;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A message posted to a channel, group or direct message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    /// Message subtype, empty for plain user messages
    pub subtype: String,

    pub channel: String,
    pub channel_type: String,
    pub user: String,
    pub text: String,
    pub ts: String,
    pub thread_ts: Option<String>,
    pub event_ts: String,
    pub bot_id: Option<String>,
    pub team: Option<String>,
}

// ============================================================================
// Predicates
// ============================================================================

struct TextMatches(Regex);

impl Predicate<MessageEvent> for TextMatches {
    fn matches(&self, _ctx: &RequestContext, event: &MessageEvent) -> bool {
        self.0.is_match(&event.text)
    }
}

/// Matches messages whose text matches `pattern` anywhere
pub fn text_matches(pattern: Regex) -> BoxPredicate<MessageEvent> {
    Arc::new(TextMatches(pattern))
}

struct InChannel(String);

impl Predicate<MessageEvent> for InChannel {
    fn matches(&self, _ctx: &RequestContext, event: &MessageEvent) -> bool {
        event.channel == self.0
    }
}

/// Matches messages posted to the channel with the given ID
pub fn channel(id: impl Into<String>) -> BoxPredicate<MessageEvent> {
    Arc::new(InChannel(id.into()))
}

struct Subtype(String);

impl Predicate<MessageEvent> for Subtype {
    fn matches(&self, _ctx: &RequestContext, event: &MessageEvent) -> bool {
        event.subtype == self.0
    }
}

/// Matches messages with the given subtype, e.g. `bot_message` or `channel_join`.
///
/// The full list of subtypes is at <https://api.slack.com/events/message>.
pub fn subtype(subtype: impl Into<String>) -> BoxPredicate<MessageEvent> {
    Arc::new(Subtype(subtype.into()))
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
