//! UI Builder module for formatting messages and inline answers

use teloxide::types::{FileId, InlineQueryResult, InlineQueryResultCachedSticker};

// Import localization
use crate::localization::t_lang;

use super::events::InlineResult;

/// Static help text listing the bot's commands
pub fn build_help_message(language_code: Option<&str>) -> String {
    [
        t_lang("help-title", language_code),
        t_lang("help-tagging", language_code),
        t_lang("help-search", language_code),
        [
            t_lang("help-commands", language_code),
            t_lang("help-abort", language_code),
            t_lang("help-delete", language_code),
            t_lang("help-help", language_code),
        ]
        .join("\n"),
    ]
    .join("\n\n")
}

/// Convert numbered results into Telegram cached-sticker results
pub fn create_inline_sticker_results(results: &[InlineResult]) -> Vec<InlineQueryResult> {
    results
        .iter()
        .map(|result| {
            InlineQueryResult::CachedSticker(InlineQueryResultCachedSticker::new(
                result.result_id.clone(),
                FileId(result.sticker.clone()),
            ))
        })
        .collect()
}
