//! Transport-neutral events consumed and produced by the dialogue controller

use crate::dialogue::UserId;
use crate::tag_index::StickerRef;

/// Who sent a message, as far as the controller cares
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sender {
    pub language_code: Option<String>,
}

/// A decoded inbound update
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    Message {
        user_id: UserId,
        chat_id: i64,
        /// Message text, empty when the message has none
        text: String,
        sticker: Option<StickerRef>,
        sender: Option<Sender>,
    },
    InlineQuery {
        query_id: String,
        user_id: UserId,
        query_text: String,
    },
}

impl InboundEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            InboundEvent::Message { user_id, .. } | InboundEvent::InlineQuery { user_id, .. } => {
                *user_id
            }
        }
    }
}

/// One entry of an inline answer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineResult {
    /// Position of the result, `"1"` for the first
    pub result_id: String,
    pub sticker: StickerRef,
}

/// What the transport should send in response to an event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundAction {
    Reply {
        chat_id: i64,
        text: String,
    },
    InlineResults {
        query_id: String,
        results: Vec<InlineResult>,
    },
}
