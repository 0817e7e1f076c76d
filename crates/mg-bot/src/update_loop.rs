//! Long-poll update loop: fetch updates, dispatch each message, reply.
//!
//! Runs until the process shuts down; `main` races it against ctrl_c.
//! Poll failures back off briefly instead of exiting, so a Telegram
//! outage or network blip does not take the bot down.

use std::time::Duration;

use crate::dispatcher::Dispatcher;
use crate::telegram::{Message, TelegramClient};

const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub async fn run(client: &TelegramClient, dispatcher: &Dispatcher) {
    let mut offset = 0i64;
    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed; backing off");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            handle_message(client, dispatcher, message).await;
        }
    }
}

/// Dispatch a single message and send the reply. Send failures are
/// logged and dropped; the loop keeps serving other chats.
async fn handle_message(client: &TelegramClient, dispatcher: &Dispatcher, message: Message) {
    // Stickers, photos, and joins have no text and get no reply.
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let chat_id = message.chat.id;
    let from_user = message.from.as_ref().map(|user| user.id).unwrap_or(0);

    tracing::debug!(chat_id, from_user, "handling message");
    if let Err(e) = client.send_typing(chat_id).await {
        tracing::debug!(error = %e, chat_id, "sendChatAction failed");
    }

    let reply = dispatcher.handle(from_user, text).await;
    if reply.is_empty() {
        return;
    }
    if let Err(e) = client.send_message(chat_id, &reply).await {
        tracing::warn!(error = %e, chat_id, "sendMessage failed");
    }
}
