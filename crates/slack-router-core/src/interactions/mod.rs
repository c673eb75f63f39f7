//! Interaction callback payload types and predicates.
//!
//! Slack delivers interactions (button clicks, shortcuts, modal submissions and so on)
//! as an `application/x-www-form-urlencoded` body whose `payload` field holds the JSON
//! encoded [`InteractionCallback`].

use crate::handler::{BoxPredicate, Predicate};
use crate::RequestContext;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Interaction Type
// ============================================================================

/// The `type` discriminant of an interaction callback.
///
/// Well-known values are available as associated constants; any other value
/// received from Slack is preserved as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct InteractionType(Cow<'static, str>);

impl InteractionType {
    pub const BLOCK_ACTIONS: Self = Self(Cow::Borrowed("block_actions"));
    pub const BLOCK_SUGGESTION: Self = Self(Cow::Borrowed("block_suggestion"));
    pub const INTERACTIVE_MESSAGE: Self = Self(Cow::Borrowed("interactive_message"));
    pub const SHORTCUT: Self = Self(Cow::Borrowed("shortcut"));
    pub const MESSAGE_ACTION: Self = Self(Cow::Borrowed("message_action"));
    pub const VIEW_SUBMISSION: Self = Self(Cow::Borrowed("view_submission"));
    pub const VIEW_CLOSED: Self = Self(Cow::Borrowed("view_closed"));
    pub const DIALOG_SUBMISSION: Self = Self(Cow::Borrowed("dialog_submission"));
    pub const DIALOG_CANCELLATION: Self = Self(Cow::Borrowed("dialog_cancellation"));
    pub const DIALOG_SUGGESTION: Self = Self(Cow::Borrowed("dialog_suggestion"));

    pub fn new(value: impl Into<String>) -> Self {
        Self(Cow::Owned(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for InteractionType {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl From<&'static str> for InteractionType {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<InteractionType> for String {
    fn from(value: InteractionType) -> Self {
        value.0.into_owned()
    }
}

impl Default for InteractionType {
    fn default() -> Self {
        Self(Cow::Borrowed(""))
    }
}

// ============================================================================
// Payload
// ============================================================================

/// The JSON payload of an interaction callback.
///
/// Only the fields needed for routing are typed; `view` and `message` are kept as raw
/// JSON for handlers that need them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionCallback {
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,

    pub token: String,
    pub callback_id: String,
    pub trigger_id: String,
    pub response_url: String,
    pub action_ts: String,
    pub api_app_id: String,
    pub team: Option<Team>,
    pub channel: Option<Channel>,
    pub user: Option<User>,

    /// Block actions of a `block_actions` interaction
    pub actions: Vec<BlockAction>,

    pub view: Option<serde_json::Value>,
    pub message: Option<serde_json::Value>,
}

impl InteractionCallback {
    /// Find the block action identified by both `block_id` and `action_id`
    pub fn find_block_action(&self, block_id: &str, action_id: &str) -> Option<&BlockAction> {
        self.actions
            .iter()
            .find(|action| action.block_id == block_id && action.action_id == action_id)
    }
}

/// One action taken on an interactive block element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockAction {
    pub action_id: String,
    pub block_id: String,

    #[serde(rename = "type")]
    pub action_type: String,

    pub value: Option<String>,
    pub action_ts: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    pub id: String,
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub team_id: String,
}

// ============================================================================
// Predicates
// ============================================================================

struct OfType(InteractionType);

impl Predicate<InteractionCallback> for OfType {
    fn matches(&self, _ctx: &RequestContext, callback: &InteractionCallback) -> bool {
        callback.interaction_type == self.0
    }
}

/// Matches interactions of the given type
pub fn of_type(interaction_type: impl Into<InteractionType>) -> BoxPredicate<InteractionCallback> {
    Arc::new(OfType(interaction_type.into()))
}

struct HasBlockAction {
    block_id: String,
    action_id: String,
}

impl Predicate<InteractionCallback> for HasBlockAction {
    fn matches(&self, _ctx: &RequestContext, callback: &InteractionCallback) -> bool {
        callback
            .find_block_action(&self.block_id, &self.action_id)
            .is_some()
    }
}

/// Matches interactions containing an action with both the given block and action IDs
pub fn block_action(
    block_id: impl Into<String>,
    action_id: impl Into<String>,
) -> BoxPredicate<InteractionCallback> {
    Arc::new(HasBlockAction {
        block_id: block_id.into(),
        action_id: action_id.into(),
    })
}

struct CallbackId(String);

impl Predicate<InteractionCallback> for CallbackId {
    fn matches(&self, _ctx: &RequestContext, callback: &InteractionCallback) -> bool {
        callback.callback_id == self.0
    }
}

/// Matches interactions with the given `callback_id`
pub fn callback_id(id: impl Into<String>) -> BoxPredicate<InteractionCallback> {
    Arc::new(CallbackId(id.into()))
}

struct InChannel(String);

impl Predicate<InteractionCallback> for InChannel {
    fn matches(&self, _ctx: &RequestContext, callback: &InteractionCallback) -> bool {
        callback
            .channel
            .as_ref()
            .is_some_and(|channel| channel.id == self.0)
    }
}

/// Matches interactions that happened in the channel with the given ID
pub fn channel(id: impl Into<String>) -> BoxPredicate<InteractionCallback> {
    Arc::new(InChannel(id.into()))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
