//! Dialogue Controller module: turns one inbound event into at most one outbound action

use tracing::{debug, info, warn};

use crate::dialogue::{command_name, ConversationStates, TagRejection, Transition, UserId, MAX_TAG_CHARS};
use crate::localization::{t_args_lang, t_lang};
use crate::tag_index::{normalize_tag, StickerRef, TagIndex};

use super::events::{InboundEvent, InlineResult, OutboundAction, Sender};
use super::ui_builder::build_help_message;

/// Telegram accepts at most this many results per inline answer
pub const MAX_INLINE_RESULTS: usize = 50;

/// Commands handled before the tagging dialogue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// `/help` or `/start`
    Help,
    /// `/delete <tag>`; `None` when the tag is missing
    Delete(Option<&'a str>),
}

/// Recognize a controller command in `text`.
///
/// The tag of `/delete` is everything after the first whitespace, verbatim.
pub fn parse_command(text: &str) -> Option<Command<'_>> {
    match command_name(text)? {
        "help" | "start" => Some(Command::Help),
        "delete" => Some(Command::Delete(
            text.split_once(char::is_whitespace)
                .map(|(_, tag)| tag)
                .filter(|tag| !tag.is_empty()),
        )),
        _ => None,
    }
}

/// Number stickers as inline results `1..=N`, keeping at most [`MAX_INLINE_RESULTS`]
pub fn number_results(stickers: Vec<StickerRef>) -> Vec<InlineResult> {
    stickers
        .into_iter()
        .take(MAX_INLINE_RESULTS)
        .enumerate()
        .map(|(i, sticker)| InlineResult {
            result_id: (i + 1).to_string(),
            sticker,
        })
        .collect()
}

/// Composes the conversation state machine and the tag index
pub struct DialogueController {
    index: TagIndex,
    conversations: ConversationStates,
}

impl DialogueController {
    pub fn new(index: TagIndex) -> Self {
        Self {
            index,
            conversations: ConversationStates::new(),
        }
    }

    pub fn index(&self) -> &TagIndex {
        &self.index
    }

    pub fn conversations(&self) -> &ConversationStates {
        &self.conversations
    }

    /// Handle one inbound event.
    ///
    /// Every message gets exactly one reply. Inline queries get an answer
    /// only when the tag has stickers.
    pub async fn handle_event(&self, event: InboundEvent) -> Option<OutboundAction> {
        match event {
            InboundEvent::Message {
                user_id,
                chat_id,
                text,
                sticker,
                sender,
            } => {
                let reply = self.handle_message(user_id, &text, sticker, sender).await;
                Some(OutboundAction::Reply {
                    chat_id,
                    text: reply,
                })
            }
            InboundEvent::InlineQuery {
                query_id,
                user_id,
                query_text,
            } => self.handle_inline_query(user_id, query_id, &query_text).await,
        }
    }

    async fn handle_message(
        &self,
        user_id: UserId,
        text: &str,
        sticker: Option<StickerRef>,
        sender: Option<Sender>,
    ) -> String {
        let language_code = sender.and_then(|sender| sender.language_code);
        let language_code = language_code.as_deref();

        match parse_command(text) {
            Some(Command::Help) => build_help_message(language_code),
            Some(Command::Delete(Some(tag))) => self.delete_tag(user_id, tag, language_code).await,
            Some(Command::Delete(None)) => {
                debug!(user_id, "Delete command without tag");
                t_lang("delete-usage", language_code)
            }
            None => {
                self.advance_dialogue(user_id, text, sticker, language_code)
                    .await
            }
        }
    }

    async fn delete_tag(&self, user_id: UserId, tag: &str, language_code: Option<&str>) -> String {
        match self.index.delete_tag(tag).await {
            Ok(()) => {
                info!(user_id, tag = %tag, "User deleted tag");
                t_args_lang("tag-deleted", &[("tag", tag)], language_code)
            }
            Err(e) => {
                warn!(user_id, tag = %tag, error = %e, "Reporting failed tag deletion to user");
                t_lang("tag-delete-failed", language_code)
            }
        }
    }

    async fn advance_dialogue(
        &self,
        user_id: UserId,
        text: &str,
        sticker: Option<StickerRef>,
        language_code: Option<&str>,
    ) -> String {
        match self.conversations.advance(user_id, text, sticker).await {
            Transition::AwaitTag { sticker } => {
                info!(user_id, sticker = %sticker, "Waiting for a tag");
                t_lang("prompt-send-tag", language_code)
            }
            Transition::PromptForSticker => t_lang("prompt-send-sticker", language_code),
            Transition::Aborted => {
                info!(user_id, "Tagging aborted");
                t_lang("tag-aborted", language_code)
            }
            Transition::Commit { tag, sticker } => {
                // The session is already back to idle, whatever the store does
                match self.index.add_sticker(&tag, &sticker).await {
                    Ok(_) => {
                        let tag = normalize_tag(&tag);
                        t_args_lang("tag-added", &[("tag", &tag)], language_code)
                    }
                    Err(e) => {
                        warn!(user_id, tag = %tag, error = %e, "Reporting failed tagging to user");
                        t_lang("tag-add-failed", language_code)
                    }
                }
            }
            Transition::Rejected(TagRejection::Empty) => t_lang("tag-empty", language_code),
            Transition::Rejected(TagRejection::TooLong) => t_args_lang(
                "tag-too-long",
                &[("max", &MAX_TAG_CHARS.to_string())],
                language_code,
            ),
        }
    }

    async fn handle_inline_query(
        &self,
        user_id: UserId,
        query_id: String,
        query_text: &str,
    ) -> Option<OutboundAction> {
        let stickers = match self.index.lookup(query_text).await {
            Ok(stickers) => stickers,
            Err(e) => {
                warn!(user_id, query = %query_text, error = %e, "Inline search failed");
                return None;
            }
        };

        if stickers.is_empty() {
            debug!(user_id, query = %query_text, "No stickers for inline query");
            return None;
        }
        if stickers.len() > MAX_INLINE_RESULTS {
            debug!(
                user_id,
                total = stickers.len(),
                "Truncating inline answer to {MAX_INLINE_RESULTS} results"
            );
        }

        Some(OutboundAction::InlineResults {
            query_id,
            results: number_results(stickers),
        })
    }
}
