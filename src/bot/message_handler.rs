//! Message Handler module for processing incoming Telegram updates

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InlineQuery;
use tracing::{debug, warn};

use crate::config::AuthorizedUsers;

use super::controller::DialogueController;
use super::events::{InboundEvent, OutboundAction, Sender};
use super::ui_builder::create_inline_sticker_results;

/// Shared state injected into every update handler
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<DialogueController>,
    pub authorized_users: Arc<AuthorizedUsers>,
}

impl AppState {
    pub fn new(controller: DialogueController, authorized_users: AuthorizedUsers) -> Self {
        Self {
            controller: Arc::new(controller),
            authorized_users: Arc::new(authorized_users),
        }
    }
}

/// Decode a Telegram message. Messages without a sender (channel posts) yield `None`.
pub fn message_to_event(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from.as_ref()?;

    Some(InboundEvent::Message {
        user_id: user.id.0,
        chat_id: msg.chat.id.0,
        text: msg.text().unwrap_or_default().to_string(),
        sticker: msg.sticker().map(|sticker| sticker.file.id.to_string()),
        sender: Some(Sender {
            language_code: user.language_code.clone(),
        }),
    })
}

/// Decode a Telegram inline query
pub fn inline_query_to_event(q: &InlineQuery) -> InboundEvent {
    InboundEvent::InlineQuery {
        query_id: q.id.to_string(),
        user_id: q.from.id.0,
        query_text: q.query.clone(),
    }
}

pub async fn message_handler(bot: Bot, msg: Message, app: AppState) -> Result<()> {
    let Some(event) = message_to_event(&msg) else {
        debug!(chat_id = msg.chat.id.0, "Ignoring message without sender");
        return Ok(());
    };

    let user_id = event.user_id();
    if !app.authorized_users.is_authorized(user_id) {
        debug!(user_id, "Dropping message from unauthorized user");
        return Ok(());
    }

    match app.controller.handle_event(event).await {
        Some(OutboundAction::Reply { chat_id, text }) => {
            bot.send_message(ChatId(chat_id), text).await?;
        }
        Some(other) => warn!(user_id, action = ?other, "Unexpected action for a message"),
        None => {}
    }
    Ok(())
}

pub async fn inline_query_handler(bot: Bot, q: InlineQuery, app: AppState) -> Result<()> {
    let event = inline_query_to_event(&q);

    let user_id = event.user_id();
    if !app.authorized_users.is_authorized(user_id) {
        debug!(user_id, "Dropping inline query from unauthorized user");
        return Ok(());
    }

    match app.controller.handle_event(event).await {
        Some(OutboundAction::InlineResults { results, .. }) => {
            debug!(user_id, results = results.len(), "Answering inline query");
            // Tags change at any time, so Telegram must not cache answers
            bot.answer_inline_query(q.id.clone(), create_inline_sticker_results(&results))
                .cache_time(0)
                .await?;
        }
        Some(other) => warn!(user_id, action = ?other, "Unexpected action for an inline query"),
        None => {}
    }
    Ok(())
}
