//! Tagging dialogue module for handling conversation state with users.
//!
//! Each user is either idle or waiting to send a tag for a sticker they just
//! sent. State lives in process memory only and is lost on restart.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::tag_index::StickerRef;

/// Telegram user identifier
pub type UserId = u64;

/// Command that cancels a pending tagging session
pub const ABORT_COMMAND: &str = "abort";

/// Longest accepted tag. Telegram truncates inline queries at this length,
/// so a longer tag could never be searched.
pub const MAX_TAG_CHARS: usize = 256;

/// Represents the conversation state of one user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingTag {
        sticker: StickerRef,
    },
}

/// Why a text was not accepted as a tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagRejection {
    Empty,
    TooLong,
}

/// Outcome of feeding one message to the state machine.
///
/// Tells the caller which side effect to perform; the state change itself
/// has already been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// A sticker was received while idle; ask for its tag
    AwaitTag { sticker: StickerRef },
    /// Plain text while idle; explain what the bot expects
    PromptForSticker,
    /// The pending sticker was dropped on request
    Aborted,
    /// The text is the tag for the pending sticker; the session is over
    Commit { tag: String, sticker: StickerRef },
    /// The text cannot be a tag; the session keeps waiting
    Rejected(TagRejection),
}

/// Validates a tag input. The tag is taken verbatim, without trimming.
pub fn validate_tag(text: &str) -> Result<&str, TagRejection> {
    if text.is_empty() {
        return Err(TagRejection::Empty);
    }

    if text.chars().count() > MAX_TAG_CHARS {
        return Err(TagRejection::TooLong);
    }

    Ok(text)
}

/// Name of the bot command at the start of `text`, without the leading slash
/// and without an `@botname` suffix. `None` if `text` is not a command.
pub fn command_name(text: &str) -> Option<&str> {
    let word = text.split_whitespace().next()?;
    if !text.starts_with('/') {
        return None;
    }
    let name = &word[1..];
    let name = name.split_once('@').map_or(name, |(name, _bot)| name);
    (!name.is_empty()).then_some(name)
}

impl ConversationState {
    /// Apply one message to the state.
    ///
    /// `text` is the message text (empty for sticker messages) and `sticker`
    /// the attached sticker, if any.
    pub fn advance(self, text: &str, sticker: Option<StickerRef>) -> (ConversationState, Transition) {
        match self {
            ConversationState::Idle => match sticker {
                Some(sticker) => (
                    ConversationState::AwaitingTag {
                        sticker: sticker.clone(),
                    },
                    Transition::AwaitTag { sticker },
                ),
                None => (ConversationState::Idle, Transition::PromptForSticker),
            },
            ConversationState::AwaitingTag { sticker: pending } => {
                if command_name(text) == Some(ABORT_COMMAND) {
                    return (ConversationState::Idle, Transition::Aborted);
                }
                match validate_tag(text) {
                    Ok(tag) => (
                        ConversationState::Idle,
                        Transition::Commit {
                            tag: tag.to_string(),
                            sticker: pending,
                        },
                    ),
                    Err(reason) => (
                        ConversationState::AwaitingTag { sticker: pending },
                        Transition::Rejected(reason),
                    ),
                }
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }
}

/// Conversation states of all users, shared by every update handler.
///
/// A single lock guards the map, so each message's transition is applied
/// atomically. Idle users are not stored.
#[derive(Debug, Default)]
pub struct ConversationStates {
    states: Mutex<HashMap<UserId, ConversationState>>,
}

impl ConversationStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `user_id`
    pub async fn get(&self, user_id: UserId) -> ConversationState {
        self.states
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Feed one message from `user_id` to the state machine
    pub async fn advance(
        &self,
        user_id: UserId,
        text: &str,
        sticker: Option<StickerRef>,
    ) -> Transition {
        let mut states = self.states.lock().await;
        let current = states.remove(&user_id).unwrap_or_default();
        let (next, transition) = current.advance(text, sticker);
        debug!(user_id, next_state = ?next, transition = ?transition, "Conversation transition");
        if !next.is_idle() {
            states.insert(user_id, next);
        }
        transition
    }

    /// Drop any pending session of `user_id`
    pub async fn reset(&self, user_id: UserId) {
        self.states.lock().await.remove(&user_id);
    }

    /// Number of users with a pending tagging session
    pub async fn active_sessions(&self) -> usize {
        self.states.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_validation() {
        // Valid tags
        assert_eq!(validate_tag("cat"), Ok("cat"));
        assert_eq!(validate_tag("  spaced  "), Ok("  spaced  "));
        assert!(validate_tag(&"a".repeat(MAX_TAG_CHARS)).is_ok());

        // Invalid tags
        assert_eq!(validate_tag(""), Err(TagRejection::Empty));
        assert_eq!(
            validate_tag(&"a".repeat(MAX_TAG_CHARS + 1)),
            Err(TagRejection::TooLong)
        );
    }

    #[test]
    fn test_tag_length_counts_characters() {
        // Multi-byte characters count once each
        assert!(validate_tag(&"é".repeat(MAX_TAG_CHARS)).is_ok());
    }

    #[test]
    fn test_command_name() {
        assert_eq!(command_name("/abort"), Some("abort"));
        assert_eq!(command_name("/abort@StickerTagBot"), Some("abort"));
        assert_eq!(command_name("/delete cat"), Some("delete"));
        assert_eq!(command_name("abort"), None);
        assert_eq!(command_name(" /abort"), None);
        assert_eq!(command_name("/"), None);
        assert_eq!(command_name(""), None);
    }

    #[test]
    fn test_idle_text_stays_idle() {
        let (next, transition) = ConversationState::Idle.advance("hello", None);
        assert_eq!(next, ConversationState::Idle);
        assert_eq!(transition, Transition::PromptForSticker);
    }

    #[test]
    fn test_awaiting_sticker_message_is_rejected() {
        let state = ConversationState::AwaitingTag {
            sticker: "S1".to_string(),
        };
        let (next, transition) = state.advance("", Some("S2".to_string()));
        assert_eq!(
            next,
            ConversationState::AwaitingTag {
                sticker: "S1".to_string()
            }
        );
        assert_eq!(transition, Transition::Rejected(TagRejection::Empty));
    }
}
