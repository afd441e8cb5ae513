//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `events`: transport-neutral inbound events and outbound actions
//! - `controller`: turns an event into a reply, a stored tag or search results
//! - `message_handler`: teloxide endpoints, authorization and delivery
//! - `ui_builder`: help text and inline answer formatting

pub mod controller;
pub mod events;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use message_handler::{inline_query_handler, message_handler, AppState};

pub use controller::DialogueController;
pub use events::{InboundEvent, InlineResult, OutboundAction, Sender};
