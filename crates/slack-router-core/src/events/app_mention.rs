//! `app_mention` events and their predicates.
//!
//! See <https://api.slack.com/events/app_mention>.

use crate::handler::{BoxPredicate, Predicate};
use crate::RequestContext;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A message that mentions the app.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMentionEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub user: String,
    pub text: String,
    pub ts: String,
    pub thread_ts: Option<String>,
    pub channel: String,
    pub event_ts: String,
    pub bot_id: Option<String>,
}

struct InChannel(String);

impl Predicate<AppMentionEvent> for InChannel {
    fn matches(&self, _ctx: &RequestContext, event: &AppMentionEvent) -> bool {
        event.channel == self.0
    }
}

/// Matches mentions made in the channel with the given ID
pub fn in_channel(id: impl Into<String>) -> BoxPredicate<AppMentionEvent> {
    Arc::new(InChannel(id.into()))
}

struct TextMatches(Regex);

impl Predicate<AppMentionEvent> for TextMatches {
    fn matches(&self, _ctx: &RequestContext, event: &AppMentionEvent) -> bool {
        self.0.is_match(&event.text)
    }
}

/// Matches mentions whose text matches `pattern` anywhere
pub fn text_matches(pattern: Regex) -> BoxPredicate<AppMentionEvent> {
    Arc::new(TextMatches(pattern))
}

#[cfg(test)]
#[path = "app_mention_tests.rs"]
mod tests;
