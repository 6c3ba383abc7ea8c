//! Conversation state management
//!
//! Multi-step flows ("send me the key now", "type the new label") are a
//! single tagged slot per user, consumed by the very next plain-text
//! message from that user. There is no timeout: an abandoned slot stays
//! until it is overwritten or explicitly cleared, matching the single-slot
//! prompt model of the bot's UI.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// What the next plain-text message from a user means
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationState {
    /// User was prompted for a redemption key
    AwaitingKey,
    /// User chose "custom amount" in the withdraw menu
    AwaitingCustomWithdraw,
    /// Admin is typing a new label for `target`
    AwaitingLabel { target: i64 },
    /// Admin is typing a new country for `target`
    AwaitingCountry { target: i64 },
    /// Admin is typing a broadcast message
    AwaitingBroadcast,
    /// Admin is typing the daily trade text
    AwaitingDailyText,
}

/// In-process store of per-user conversation slots
#[derive(Debug, Clone, Default)]
pub struct StateStorage {
    slots: Arc<RwLock<HashMap<i64, ConversationState>>>,
}

impl StateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) the user's slot
    pub async fn set(&self, user_id: i64, state: ConversationState) {
        debug!(user_id = user_id, state = ?state, "Conversation slot set");
        self.slots.write().await.insert(user_id, state);
    }

    /// Consume the slot: the next message handler takes it exactly once
    pub async fn take(&self, user_id: i64) -> Option<ConversationState> {
        let taken = self.slots.write().await.remove(&user_id);
        if taken.is_some() {
            debug!(user_id = user_id, state = ?taken, "Conversation slot consumed");
        }
        taken
    }

    /// Drop the slot without acting on it
    pub async fn clear(&self, user_id: i64) {
        self.slots.write().await.remove(&user_id);
    }

    pub async fn peek(&self, user_id: i64) -> Option<ConversationState> {
        self.slots.read().await.get(&user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_take_consumes_slot() {
        let storage = StateStorage::new();
        storage.set(100, ConversationState::AwaitingKey).await;

        assert_eq!(
            storage.take(100).await,
            Some(ConversationState::AwaitingKey)
        );
        assert_eq!(storage.take(100).await, None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let storage = StateStorage::new();
        storage.set(100, ConversationState::AwaitingKey).await;
        storage
            .set(100, ConversationState::AwaitingLabel { target: 200 })
            .await;

        assert_eq!(
            storage.take(100).await,
            Some(ConversationState::AwaitingLabel { target: 200 })
        );
    }

    #[tokio::test]
    async fn test_slots_are_per_user() {
        let storage = StateStorage::new();
        storage.set(100, ConversationState::AwaitingKey).await;
        assert_eq!(storage.peek(200).await, None);
        assert_eq!(
            storage.peek(100).await,
            Some(ConversationState::AwaitingKey)
        );
    }
}
