//! `reaction_added` and `reaction_removed` events and their predicates.
//!
//! Both events have the same shape, so one [`ReactionEvent`] type and one set of
//! predicates serve handlers for either.
//!
//! See <https://api.slack.com/events/reaction_added> and
//! <https://api.slack.com/events/reaction_removed>.

use crate::handler::{BoxPredicate, Predicate};
use crate::RequestContext;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A reaction added to or removed from an item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    /// User who added or removed the reaction
    pub user: String,

    /// Emoji name, without colons
    pub reaction: String,

    /// Owner of the reacted item
    pub item_user: Option<String>,

    pub item: ReactionItem,
    pub event_ts: String,
}

/// The item a reaction was applied to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionItem {
    /// `message`, `file` or `file_comment`
    #[serde(rename = "type")]
    pub item_type: String,

    pub channel: String,
    pub ts: String,

    /// The reacted message, when Slack includes it
    pub message: Option<ItemMessage>,
}

/// Message content attached to a [`ReactionItem`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemMessage {
    pub text: String,
    pub user: String,
    pub ts: String,
}

struct Name(String);

impl Predicate<ReactionEvent> for Name {
    fn matches(&self, _ctx: &RequestContext, event: &ReactionEvent) -> bool {
        event.reaction == self.0
    }
}

/// Matches reactions with the given emoji name
pub fn name(reaction: impl Into<String>) -> BoxPredicate<ReactionEvent> {
    Arc::new(Name(reaction.into()))
}

struct InChannel(String);

impl Predicate<ReactionEvent> for InChannel {
    fn matches(&self, _ctx: &RequestContext, event: &ReactionEvent) -> bool {
        event.item.channel == self.0
    }
}

/// Matches reactions to items in the channel with the given ID
pub fn channel(id: impl Into<String>) -> BoxPredicate<ReactionEvent> {
    Arc::new(InChannel(id.into()))
}

struct MessageTextMatches(Regex);

impl Predicate<ReactionEvent> for MessageTextMatches {
    fn matches(&self, _ctx: &RequestContext, event: &ReactionEvent) -> bool {
        event
            .item
            .message
            .as_ref()
            .is_some_and(|message| self.0.is_match(&message.text))
    }
}

/// Matches reactions to messages whose text matches `pattern`.
///
/// Reactions whose item carries no message never match.
pub fn message_text_matches(pattern: Regex) -> BoxPredicate<ReactionEvent> {
    Arc::new(MessageTextMatches(pattern))
}

#[cfg(test)]
#[path = "reaction_tests.rs"]
mod tests;
