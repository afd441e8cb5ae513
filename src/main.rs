use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};

use stickertags::bot::{self, AppState, DialogueController};
use stickertags::config::BotConfig;
use stickertags::db::{MemoryTagStore, PgTagStore, TagStore};
use stickertags::logging;
use stickertags::tag_index::TagIndex;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;

    logging::init(config.log_format);

    info!("Starting Sticker Tags Telegram Bot");

    for entry in config.authorized_users.invalid_entries() {
        warn!(entry = %entry, "Ignoring invalid authorized user id");
    }
    if config.authorized_users.is_empty() {
        warn!("No authorized users configured, every update will be dropped");
    } else {
        info!(users = config.authorized_users.len(), "Authorized users loaded");
    }

    // Open the tag store once for the whole process
    let pg_store = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database");
            Some(PgTagStore::connect(database_url).await?)
        }
        None => {
            warn!("DATABASE_URL is not set, tags are kept in memory and lost on restart");
            None
        }
    };
    let store: Arc<dyn TagStore> = match &pg_store {
        Some(pg_store) => Arc::new(pg_store.clone()),
        None => Arc::new(MemoryTagStore::new()),
    };

    let controller = DialogueController::new(TagIndex::new(store));
    let app = AppState::new(controller, config.authorized_users.clone());

    // Initialize the bot
    let bot = Bot::new(&config.telegram_bot_token);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(bot::message_handler))
        .branch(Update::filter_inline_query().endpoint(bot::inline_query_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    if let Some(pg_store) = pg_store {
        pg_store.close().await;
    }

    info!("Bot stopped");
    Ok(())
}
