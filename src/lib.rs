//! # Sticker Tags Telegram Bot
//!
//! A Telegram bot that lets users file stickers under free-text tags and
//! find them again through inline search.

pub mod bot;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod logging;
pub mod tag_index;
