//! Outbound notification service
//!
//! Best-effort sends: failures are logged and never propagated, so a
//! blocked or deleted chat can't fail the triggering command. Also carries
//! the admin broadcast and document-export capabilities.

use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct NotificationService {
    bot: Bot,
}

impl NotificationService {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send a message, swallowing delivery failures
    pub async fn notify(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.bot.send_message(ChatId(chat_id), text).await {
            warn!(chat_id = chat_id, error = %e, "Notification delivery failed");
        }
    }

    /// Send `text` to every id, sequentially. Returns (sent, failed).
    pub async fn broadcast(&self, chat_ids: &[i64], text: &str) -> (usize, usize) {
        let mut sent = 0;
        let mut failed = 0;
        for &chat_id in chat_ids {
            match self.bot.send_message(ChatId(chat_id), text).await {
                Ok(_) => sent += 1,
                Err(e) => {
                    failed += 1;
                    warn!(chat_id = chat_id, error = %e, "Broadcast delivery failed");
                }
            }
        }
        info!(sent = sent, failed = failed, "Broadcast finished");
        (sent, failed)
    }

    /// Send an in-memory file, best-effort
    pub async fn send_document(&self, chat_id: i64, filename: &str, bytes: Vec<u8>) {
        let file = InputFile::memory(bytes).file_name(filename.to_string());
        if let Err(e) = self.bot.send_document(ChatId(chat_id), file).await {
            warn!(chat_id = chat_id, filename = filename, error = %e, "Document delivery failed");
        }
    }
}
